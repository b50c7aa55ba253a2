//! 寄存器地址与指令码定义
//!
//! 寄存器分为三段：
//! - ROM：设备类型、版本号、MAC 地址（只读）
//! - EEPROM：设备 ID、波特率、拨杆零位偏移（需先解锁才能写入）
//! - RAM：EEPROM 写锁、零位标定、分拣指令、按键使能、反馈频率、执行/垃圾桶状态

use num_enum::TryFromPrimitive;

// ============================================================================
// 帧常量
// ============================================================================

/// 帧起始标志（第 1 字节）
pub const START_MARKER_0: u8 = 0xAA;
/// 帧起始标志（第 2 字节）
pub const START_MARKER_1: u8 = 0x77;

/// 寄存器地址空间大小（0-255）
pub const REGISTER_COUNT: usize = 256;

// ============================================================================
// ROM
// ============================================================================

/// 设备类型
pub const REG_DEVICE_TYPE: u8 = 0;
/// 固件版本（原始值 / 10 = 版本号）
pub const REG_VERSION: u8 = 1;
/// MAC 地址起始（6 字节，2..=7）
pub const REG_MAC: u8 = 2;
/// MAC 地址长度
pub const MAC_LEN: u8 = 6;

// ============================================================================
// EEPROM
// ============================================================================

/// EEPROM 大小
pub const REG_EEPROM_SIZE: u8 = 6;
/// EEPROM 基地址
pub const REG_EEPROM_BASE: u8 = 11;
/// 设备 ID（与 EEPROM 基地址重合）
pub const REG_DEVICE_ID: u8 = 11;
/// 波特率
pub const REG_BAUD_RATE: u8 = 12;
/// 拨杆零位偏移起始（4 字节，13..=16）
pub const REG_LEVER_OFFSET: u8 = 13;
/// 拨杆数量
pub const LEVER_COUNT: u8 = 4;

// ============================================================================
// RAM
// ============================================================================

/// EEPROM 写锁：0 = 解锁（允许写入），1 = 上锁
pub const REG_EEPROM_LOCK: u8 = 28;
/// 零位标定触发：1 = 标定一次，2 = 清除偏移，3 = 拨杆卸力
pub const REG_OFFSET_CALIBRATION: u8 = 29;
/// 分拣指令：0 = 停止，1..=4 = 分拣 ID
pub const REG_SORTING: u8 = 30;
/// 按键使能：0 = 禁用，1 = 使能
pub const REG_BUTTON_ENABLE: u8 = 66;
/// 自动反馈频率（Hz），0 = 关闭
pub const REG_FEEDBACK_FREQUENCY: u8 = 67;
/// 执行状态：0 = 动作完成，1 = 执行中
pub const REG_EXECUTION_STATUS: u8 = 68;
/// 垃圾桶状态：bit1..bit4 对应 1..4 号桶，1 = 满载
pub const REG_BIN_STATUS: u8 = 69;

/// 零位标定寄存器的取值
pub mod calibration {
    /// 标定一次
    pub const CALIBRATE: u8 = 1;
    /// 清除偏移
    pub const CLEAR: u8 = 2;
    /// 拨杆卸力
    pub const RELEASE: u8 = 3;
}

/// EEPROM 写锁取值
pub mod lock {
    /// 解锁（允许写入）
    pub const UNLOCKED: u8 = 0;
    /// 上锁（保护 EEPROM）
    pub const LOCKED: u8 = 1;
}

/// 最大分拣 ID（0 表示停止）
pub const MAX_SORTING_ID: u8 = 4;

// ============================================================================
// 指令码
// ============================================================================

/// 帧指令码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// 读寄存器（主机请求 / 设备应答）
    ReadRegister = 0x03,
    /// 写寄存器（仅主机 -> 设备）
    WriteRegister = 0x04,
    /// 设备主动反馈
    Feedback = 0x05,
    /// 报警（固定 2 字节负载）
    Alarm = 0x08,
}

impl Instruction {
    /// 解码器是否接受此指令（仅设备 -> 主机方向）
    pub fn is_inbound(self) -> bool {
        !matches!(self, Instruction::WriteRegister)
    }
}

impl From<Instruction> for u8 {
    fn from(value: Instruction) -> Self {
        value as u8
    }
}
