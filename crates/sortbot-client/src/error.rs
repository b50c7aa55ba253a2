//! 客户端层错误类型

use sortbot_driver::DriverError;
use thiserror::Error;

/// 客户端层错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 驱动层错误（串口故障、参数错误）
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 配置不合法
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 配置文件解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// 配置文件读取失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbot_serial::SerialError;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::from(DriverError::Serial(SerialError::Disconnected));
        assert!(err.to_string().starts_with("Driver error"));

        let err = ClientError::InvalidConfig("window_len must be > 0".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: window_len must be > 0"
        );
    }
}
