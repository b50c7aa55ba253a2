//! 寄存器客户端配置

use std::time::Duration;

/// 寄存器客户端配置
///
/// # Example
///
/// ```
/// use sortbot_driver::ClientConfig;
/// use std::time::Duration;
///
/// // 默认：10 次 × 5ms 应答轮询，EEPROM 写入间隔 30ms
/// let config = ClientConfig::default();
/// assert_eq!(config.response_budget(), Duration::from_millis(50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// 等待读应答的轮询次数
    pub response_attempts: u32,
    /// 每次轮询前的等待时间
    pub response_interval: Duration,
    /// EEPROM 解锁/写入/上锁之间的稳定时间
    ///
    /// 硬件约束：EEPROM 写周期需要此间隔，缩短可能导致写入损坏。
    pub eeprom_settle: Duration,
}

impl ClientConfig {
    /// 最长等待时间（轮询次数 × 间隔）
    pub fn response_budget(&self) -> Duration {
        self.response_interval * self.response_attempts
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_attempts: 10,
            response_interval: Duration::from_millis(5),
            eeprom_settle: Duration::from_millis(30),
        }
    }
}
