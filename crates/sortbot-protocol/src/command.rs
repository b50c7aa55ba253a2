//! 命令帧构建
//!
//! 所有主机 -> 设备的帧格式为：
//!
//! ```text
//! 0xAA 0x77 <instruction> <addr> <len> [data...] <crc_low> <crc_high>
//! ```
//!
//! CRC 覆盖从起始标志到最后一个数据字节的全部内容。

use crate::ProtocolError;
use crate::crc::{crc_bytes, crc16_modbus};
use crate::registers::{Instruction, START_MARKER_0, START_MARKER_1};
use smallvec::SmallVec;

/// 编码后的帧字节
///
/// 栈上预留 16 字节，足以覆盖读请求（7 字节）和单字节写（8 字节），
/// 较长的多字节写才会退化为堆分配。
pub type FrameBytes = SmallVec<[u8; 16]>;

/// 帧头 + 指令 + 地址 + 长度
const HEADER_LEN: usize = 5;

/// 读寄存器请求 (0x03)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRegisterCommand {
    pub addr: u8,
    pub len: u8,
}

impl ReadRegisterCommand {
    pub fn new(addr: u8, len: u8) -> Self {
        Self { addr, len }
    }

    /// 编码为线上字节
    pub fn to_bytes(self) -> FrameBytes {
        seal(Instruction::ReadRegister, self.addr, self.len, &[])
    }
}

/// 写寄存器请求 (0x04)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRegisterCommand {
    pub addr: u8,
    pub data: SmallVec<[u8; 8]>,
}

impl WriteRegisterCommand {
    /// 创建多字节写命令
    ///
    /// # 错误
    ///
    /// - 数据为空
    /// - 数据长度超过 255（长度字段只有 1 字节）
    /// - 写入范围越过寄存器地址空间末尾
    pub fn new(addr: u8, data: &[u8]) -> Result<Self, ProtocolError> {
        if data.is_empty() || data.len() > u8::MAX as usize {
            return Err(ProtocolError::InvalidLength {
                expected: 1,
                actual: data.len(),
            });
        }
        if addr as usize + data.len() > crate::REGISTER_COUNT {
            return Err(ProtocolError::RegisterOverflow {
                addr,
                len: data.len(),
            });
        }
        Ok(Self {
            addr,
            data: SmallVec::from_slice(data),
        })
    }

    /// 创建单字节写命令
    pub fn single(addr: u8, value: u8) -> Self {
        let mut data = SmallVec::new();
        data.push(value);
        Self { addr, data }
    }

    /// 编码为线上字节
    pub fn to_bytes(&self) -> FrameBytes {
        seal(
            Instruction::WriteRegister,
            self.addr,
            self.data.len() as u8,
            &self.data,
        )
    }
}

/// 拼装 `[marker, marker, instruction, addr, len, data..]` 并追加 CRC
///
/// 读应答 (0x03) 和主动反馈 (0x05) 与写请求共用同一布局，
/// 因此测试和模拟设备也用它来构造设备侧帧。
pub fn seal(instruction: Instruction, addr: u8, len: u8, data: &[u8]) -> FrameBytes {
    let mut bytes = FrameBytes::with_capacity(HEADER_LEN + data.len() + 2);
    bytes.extend_from_slice(&[START_MARKER_0, START_MARKER_1, instruction.into(), addr, len]);
    bytes.extend_from_slice(data);
    let crc = crc_bytes(crc16_modbus(&bytes));
    bytes.extend_from_slice(&crc);
    bytes
}

/// 构造报警帧 (0x08)，仅用于模拟设备
pub fn seal_alarm(level: u8, kind: u8) -> FrameBytes {
    let mut bytes = FrameBytes::new();
    bytes.extend_from_slice(&[START_MARKER_0, START_MARKER_1, Instruction::Alarm.into(), level, kind]);
    let crc = crc_bytes(crc16_modbus(&bytes));
    bytes.extend_from_slice(&crc);
    bytes
}
