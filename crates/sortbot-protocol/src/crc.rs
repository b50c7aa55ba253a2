//! CRC16-Modbus 校验
//!
//! 多项式 0x8005，初始值 0xFFFF，输入/输出字节按位反转（reflected）。
//! 反射形式等价于使用多项式 0xA001 的右移算法，这里用编译期查表实现。
//!
//! 发送端与接收端共用同一个纯函数 [`crc16_modbus`]，不依赖任何外部状态。

/// 反射后的多项式（0x8005 按位反转）
const POLY_REFLECTED: u16 = 0xA001;

/// 初始值
const INIT: u16 = 0xFFFF;

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLY_REFLECTED;
            } else {
                crc >>= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u16; 256] = build_crc_table();

/// 计算 CRC16-Modbus
///
/// # Example
///
/// ```
/// use sortbot_protocol::crc16_modbus;
///
/// // Modbus 标准校验值
/// assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
/// ```
pub fn crc16_modbus(data: &[u8]) -> u16 {
    data.iter().fold(INIT, |crc, &byte| {
        let idx = ((crc ^ byte as u16) & 0x00FF) as usize;
        (crc >> 8) ^ CRC_TABLE[idx]
    })
}

/// 将 CRC 拆分为线上顺序 `[low, high]`
#[inline]
pub fn crc_bytes(crc: u16) -> [u8; 2] {
    crc.to_le_bytes()
}

/// 校验 `data` 的 CRC 是否等于给定的低/高字节
#[inline]
pub fn crc_matches(data: &[u8], low: u8, high: u8) -> bool {
    crc_bytes(crc16_modbus(data)) == [low, high]
}
