//! # Sortbot Serial Adapter Layer
//!
//! 串口传输抽象：协议层只需要"写字节"和"有数据时读一个字节"两个能力。
//!
//! - `native`（默认）：基于 `serialport` 的真实串口
//! - `mock`：内存中的模拟设备，用于测试

use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::{PortInfo, SerialPortAdapter, available_ports};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockDevice, MockSerialAdapter};

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// 默认读超时
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// 串口层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("Port not found: {0}")]
    NotFound(String),

    #[error("Port disconnected")]
    Disconnected,
}

/// 串口适配器
///
/// 读操作是非阻塞的：没有可用数据时返回 `Ok(None)`，
/// 这样调用方可以在每次轮询时把所有可用字节交给解码器，而不会被串口阻塞。
pub trait SerialAdapter {
    /// 写入全部字节
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError>;

    /// 读取一个可用字节，无数据时返回 `None`
    fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError>;

    /// 读取当前所有可用字节，追加到 `out`，返回读取数量
    fn drain_into(&mut self, out: &mut Vec<u8>) -> Result<usize, SerialError> {
        let start = out.len();
        while let Some(byte) = self.try_read_byte()? {
            out.push(byte);
        }
        Ok(out.len() - start)
    }

    /// 适配器名称（用于日志）
    fn name(&self) -> &str {
        "serial"
    }
}

impl<T: SerialAdapter + ?Sized> SerialAdapter for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        (**self).write_all(bytes)
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        (**self).try_read_byte()
    }

    fn drain_into(&mut self, out: &mut Vec<u8>) -> Result<usize, SerialError> {
        (**self).drain_into(out)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
