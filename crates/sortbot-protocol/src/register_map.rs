//! 寄存器镜像
//!
//! 主机侧保存的设备寄存器最新已知值（地址 0-255）。
//! 只有通过 CRC 校验的读应答/主动反馈才会写入，且一次写入整段 `[addr, addr + len)`。

use crate::decoder::RegisterUpdate;
use crate::registers::REGISTER_COUNT;

/// 寄存器镜像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMap {
    values: [u8; REGISTER_COUNT],
}

impl RegisterMap {
    /// 创建全零的寄存器镜像
    pub fn new() -> Self {
        Self {
            values: [0; REGISTER_COUNT],
        }
    }

    /// 读取单个寄存器
    #[inline]
    pub fn get(&self, addr: u8) -> u8 {
        self.values[addr as usize]
    }

    /// 读取连续寄存器
    ///
    /// 范围越过地址空间末尾时截断。
    pub fn slice(&self, addr: u8, len: u8) -> &[u8] {
        let start = addr as usize;
        let end = (start + len as usize).min(REGISTER_COUNT);
        &self.values[start..end]
    }

    /// 读取固定长度的连续寄存器
    ///
    /// 调用方保证 `addr + N <= 256`（寄存器常量均满足）。
    pub fn array<const N: usize>(&self, addr: u8) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.values[addr as usize..addr as usize + N]);
        out
    }

    /// 应用一次已校验的更新
    ///
    /// 解码器已保证范围合法；这里仍做截断，避免越界 panic。
    pub(crate) fn apply(&mut self, update: &RegisterUpdate) {
        let range = update.range();
        let end = range.end.min(REGISTER_COUNT);
        let count = end.saturating_sub(range.start);
        self.values[range.start..end].copy_from_slice(&update.data[..count]);
    }

    /// 全部寄存器值
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::new()
    }
}
