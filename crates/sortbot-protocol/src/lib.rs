//! # Sortbot Protocol
//!
//! 传送带分拣机器人串口寄存器协议（无硬件依赖）
//!
//! ## 模块
//!
//! - `crc`: CRC16-Modbus 校验
//! - `registers`: 寄存器地址与指令码
//! - `command`: 主机 -> 设备命令帧构建
//! - `decoder`: 设备 -> 主机逐字节帧解码
//! - `register_map`: 寄存器镜像
//!
//! ## 帧格式
//!
//! ```text
//! 0xAA 0x77 <instruction> <payload...> <crc_low> <crc_high>
//! ```
//!
//! CRC 覆盖起始标志、指令和负载。多字节字段均为原始字节，CRC 低字节在前。

pub mod command;
pub mod crc;
pub mod decoder;
pub mod register_map;
pub mod registers;

// 重新导出常用类型
pub use command::{FrameBytes, ReadRegisterCommand, WriteRegisterCommand, seal, seal_alarm};
pub use crc::{crc_bytes, crc_matches, crc16_modbus};
pub use decoder::{Alarm, DecodedEvent, DecoderStats, FrameDecoder, RegisterUpdate};
pub use register_map::RegisterMap;
pub use registers::*;

use thiserror::Error;

/// 协议错误类型
///
/// 仅用于主机侧构造命令时的参数校验；
/// 接收方向的组帧/校验错误不会以 `Err` 形式出现。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid payload length: expected at least {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Register range 0x{addr:02X}+{len} exceeds register space")]
    RegisterOverflow { addr: u8, len: usize },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },
}
