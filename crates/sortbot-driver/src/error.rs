//! 驱动层错误类型定义

use sortbot_protocol::ProtocolError;
use sortbot_serial::SerialError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 只有传输故障和调用参数错误会以 `Err` 返回；
/// 应答超时由 [`RegisterRead::Stale`](crate::RegisterRead::Stale) 表示，
/// 调用方需要时可通过 [`RegisterRead::fresh_or_timeout`](crate::RegisterRead::fresh_or_timeout)
/// 转换为 [`DriverError::ResponseTimeout`]。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口错误
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),

    /// 协议参数错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 在轮询预算内未收到读应答
    #[error("No response for register 0x{addr:02X}")]
    ResponseTimeout { addr: u8 },
}
