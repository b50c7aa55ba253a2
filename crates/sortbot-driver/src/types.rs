//! 寄存器读取结果与类型化投影

use crate::error::DriverError;
use std::fmt;

/// 一次寄存器读取的结果
///
/// 协议没有请求/应答关联 ID，读应答可能丢失。超时后客户端仍会返回
/// 寄存器镜像中的旧值，但标记为 `Stale`：调用方应将其视为"未知"，而不是真实值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterRead<T> {
    /// 在轮询预算内收到了读应答
    Fresh(T),
    /// 未收到读应答，值来自更新前的寄存器镜像
    Stale(T),
}

impl<T> RegisterRead<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, RegisterRead::Fresh(_))
    }

    /// 仅在收到应答时返回值
    pub fn fresh(self) -> Option<T> {
        match self {
            RegisterRead::Fresh(v) => Some(v),
            RegisterRead::Stale(_) => None,
        }
    }

    /// 超时转换为 [`DriverError::ResponseTimeout`]
    pub fn fresh_or_timeout(self, addr: u8) -> Result<T, DriverError> {
        self.fresh().ok_or(DriverError::ResponseTimeout { addr })
    }

    /// 无论新旧都取出值
    pub fn into_inner(self) -> T {
        match self {
            RegisterRead::Fresh(v) | RegisterRead::Stale(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RegisterRead<U> {
        match self {
            RegisterRead::Fresh(v) => RegisterRead::Fresh(f(v)),
            RegisterRead::Stale(v) => RegisterRead::Stale(f(v)),
        }
    }
}

/// 固件版本（寄存器原始值 / 10，保留一位小数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareVersion(pub u8);

impl FirmwareVersion {
    pub fn as_f32(self) -> f32 {
        self.0 as f32 / 10.0
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// MAC 地址（寄存器存储顺序）
///
/// 线上与寄存器中为低字节在前，显示时按字节倒序输出，
/// 与设备标签上的 MAC 一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// 倒序后的字节（显示顺序）
    pub fn display_bytes(&self) -> [u8; 6] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.display_bytes()))
    }
}

/// 执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// 动作完成
    Done,
    /// 执行中
    InProgress,
    /// 未定义的原始值
    Unknown(u8),
}

impl From<u8> for ExecutionStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => ExecutionStatus::Done,
            1 => ExecutionStatus::InProgress,
            other => ExecutionStatus::Unknown(other),
        }
    }
}

/// 垃圾桶状态
///
/// bit1..bit4 分别对应 1..4 号桶，1 = 满载（兼容垃圾桶 V2.0）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinStatus(pub u8);

impl BinStatus {
    /// `bin` 号桶是否满载（1..=4，其它返回 false）
    pub fn is_full(self, bin: u8) -> bool {
        (1..=4).contains(&bin) && self.0 & (1 << bin) != 0
    }

    /// 所有满载的桶号
    pub fn full_bins(self) -> impl Iterator<Item = u8> {
        (1..=4).filter(move |&bin| self.is_full(bin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_display_reverses_byte_order() {
        let mac = MacAddress([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(mac.to_string(), "060504030201");
    }

    #[test]
    fn test_mac_display_uppercase() {
        let mac = MacAddress([0xAB, 0xCD, 0xEF, 0x00, 0x10, 0x0F]);
        assert_eq!(mac.to_string(), "0F1000EFCDAB");
    }

    #[test]
    fn test_version_display() {
        assert_eq!(FirmwareVersion(12).to_string(), "1.2");
        assert_eq!(FirmwareVersion(0).to_string(), "0.0");
        assert_eq!(FirmwareVersion(255).to_string(), "25.5");
        assert!((FirmwareVersion(12).as_f32() - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_execution_status() {
        assert_eq!(ExecutionStatus::from(0), ExecutionStatus::Done);
        assert_eq!(ExecutionStatus::from(1), ExecutionStatus::InProgress);
        assert_eq!(ExecutionStatus::from(7), ExecutionStatus::Unknown(7));
    }

    #[test]
    fn test_bin_status() {
        let status = BinStatus(0b0001_0100);
        assert!(!status.is_full(1));
        assert!(status.is_full(2));
        assert!(!status.is_full(3));
        assert!(status.is_full(4));
        assert!(!status.is_full(0));
        assert!(!status.is_full(5));
        assert_eq!(status.full_bins().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_register_read() {
        let fresh = RegisterRead::Fresh(3u8);
        let stale = RegisterRead::Stale(3u8);
        assert!(fresh.is_fresh());
        assert!(!stale.is_fresh());
        assert_eq!(fresh.fresh(), Some(3));
        assert_eq!(stale.fresh(), None);
        assert_eq!(stale.into_inner(), 3);
        assert_eq!(fresh.map(|v| v * 2), RegisterRead::Fresh(6));
        assert!(matches!(
            stale.fresh_or_timeout(68),
            Err(DriverError::ResponseTimeout { addr: 68 })
        ));
    }
}
