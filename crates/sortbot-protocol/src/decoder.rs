//! 逐字节帧解码器
//!
//! 串口每次只交付一个字节，解码器在多次调用之间保存组帧状态：
//!
//! ```text
//! Hunting ──(0xAA,0x77)──> AwaitInstruction ──(0x03/0x05/0x08)──> Payload
//!    ^                            │                                  │
//!    └──────── 未知指令 ───────────┘                                  │
//!    └──────────────── 负载收齐（无论 CRC 是否通过）─────────────────────┘
//! ```
//!
//! - 0x03 / 0x05 负载：`[addr, len, data[len], crc_low, crc_high]`
//! - 0x08 负载：`[level, type, crc_low, crc_high]`
//!
//! 每个帧尝试结束后（成功或失败）都完全复位，不保留任何错位字节。
//! CRC 失败和未知指令都不是错误：帧被静默丢弃，仅计入 [`DecoderStats`]。

use crate::crc::crc_matches;
use crate::register_map::RegisterMap;
use crate::registers::{Instruction, REGISTER_COUNT, START_MARKER_0, START_MARKER_1};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// 0x08 报警帧负载长度（level + type + CRC）
const ALARM_PAYLOAD_LEN: usize = 4;

/// 寄存器数据（读应答或主动反馈）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUpdate {
    /// 起始地址
    pub addr: u8,
    /// 连续寄存器值，覆盖 `[addr, addr + data.len())`
    pub data: SmallVec<[u8; 8]>,
}

impl RegisterUpdate {
    /// 覆盖的地址范围
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.addr as usize;
        start..start + self.data.len()
    }
}

/// 报警
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alarm {
    pub level: u8,
    pub kind: u8,
}

/// 解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    /// 读寄存器应答 (0x03)
    ReadResponse(RegisterUpdate),
    /// 设备主动反馈 (0x05)
    Feedback(RegisterUpdate),
    /// 报警 (0x08)
    Alarm(Alarm),
}

impl DecodedEvent {
    /// 对应的指令码
    pub fn instruction(&self) -> Instruction {
        match self {
            DecodedEvent::ReadResponse(_) => Instruction::ReadRegister,
            DecodedEvent::Feedback(_) => Instruction::Feedback,
            DecodedEvent::Alarm(_) => Instruction::Alarm,
        }
    }

    /// 携带的寄存器数据（报警帧没有）
    pub fn register_update(&self) -> Option<&RegisterUpdate> {
        match self {
            DecodedEvent::ReadResponse(update) | DecodedEvent::Feedback(update) => Some(update),
            DecodedEvent::Alarm(_) => None,
        }
    }

    pub fn is_read_response(&self) -> bool {
        matches!(self, DecodedEvent::ReadResponse(_))
    }
}

/// 解码统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// 成功解码的帧数
    pub frames: u64,
    /// CRC 校验失败的帧数
    pub checksum_errors: u64,
    /// 组帧错误（未知指令、写指令回环、地址越界）
    pub framing_errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// 寻找起始标志
    Hunting,
    /// 已同步，下一个字节是指令
    AwaitInstruction,
    /// 正在接收负载
    Payload(Instruction),
}

/// 帧解码器
///
/// 每条串口链路持有一个实例，状态不跨实例共享。
///
/// # Example
///
/// ```
/// use sortbot_protocol::{DecodedEvent, FrameDecoder, Instruction, RegisterMap, seal};
///
/// let mut decoder = FrameDecoder::new();
/// let mut registers = RegisterMap::new();
///
/// let frame = seal(Instruction::ReadRegister, 1, 1, &[12]);
/// let mut events = Vec::new();
/// for &byte in frame.iter() {
///     if let Some(event) = decoder.feed_into(byte, &mut registers) {
///         events.push(event);
///     }
/// }
///
/// assert_eq!(events.len(), 1);
/// assert!(matches!(events[0], DecodedEvent::ReadResponse(_)));
/// assert_eq!(registers.get(1), 12);
/// ```
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    phase: Phase,
    prev: Option<u8>,
    payload: Vec<u8>,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            phase: Phase::Hunting,
            prev: None,
            // 最长负载：addr + len + 255 字节数据 + 2 字节 CRC
            payload: Vec::with_capacity(u8::MAX as usize + 4),
            stats: DecoderStats::default(),
        }
    }

    /// 喂入一个字节，帧完整且校验通过时返回事件
    pub fn feed(&mut self, byte: u8) -> Option<DecodedEvent> {
        let event = match self.phase {
            Phase::Hunting => {
                if self.prev == Some(START_MARKER_0) && byte == START_MARKER_1 {
                    self.phase = Phase::AwaitInstruction;
                }
                None
            },
            Phase::AwaitInstruction => {
                match Instruction::try_from(byte) {
                    Ok(instruction) if instruction.is_inbound() => {
                        self.phase = Phase::Payload(instruction);
                    },
                    _ => {
                        trace!("Unexpected instruction byte 0x{:02X}, resync", byte);
                        self.stats.framing_errors += 1;
                        self.reset();
                    },
                }
                None
            },
            Phase::Payload(instruction) => {
                self.payload.push(byte);
                self.try_complete(instruction)
            },
        };
        self.prev = Some(byte);
        event
    }

    /// 喂入一个字节；读应答/主动反馈在返回事件前先写入寄存器表
    pub fn feed_into(&mut self, byte: u8, registers: &mut RegisterMap) -> Option<DecodedEvent> {
        let event = self.feed(byte)?;
        if let Some(update) = event.register_update() {
            registers.apply(update);
        }
        Some(event)
    }

    /// 解码统计
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// 是否正处于某一帧中间
    pub fn in_frame(&self) -> bool {
        self.phase != Phase::Hunting
    }

    /// 丢弃当前组帧状态（不影响统计和前一字节记录）
    pub fn reset(&mut self) {
        self.phase = Phase::Hunting;
        self.payload.clear();
    }

    fn try_complete(&mut self, instruction: Instruction) -> Option<DecodedEvent> {
        match instruction {
            Instruction::Alarm => {
                if self.payload.len() < ALARM_PAYLOAD_LEN {
                    return None;
                }
                let (level, kind) = (self.payload[0], self.payload[1]);
                let canonical = [START_MARKER_0, START_MARKER_1, instruction.into(), level, kind];
                let valid = crc_matches(&canonical, self.payload[2], self.payload[3]);
                self.finish(valid)
                    .then_some(DecodedEvent::Alarm(Alarm { level, kind }))
            },
            Instruction::ReadRegister | Instruction::Feedback => {
                if self.payload.len() < 2 {
                    return None;
                }
                let len = self.payload[1] as usize;
                if self.payload.len() < len + 4 {
                    return None;
                }
                self.complete_register_frame(instruction, len)
            },
            // AwaitInstruction 阶段已拒绝写指令
            Instruction::WriteRegister => {
                self.stats.framing_errors += 1;
                self.reset();
                None
            },
        }
    }

    fn complete_register_frame(
        &mut self,
        instruction: Instruction,
        len: usize,
    ) -> Option<DecodedEvent> {
        let addr = self.payload[0];

        let mut canonical: SmallVec<[u8; 16]> = SmallVec::with_capacity(len + 5);
        canonical.extend_from_slice(&[START_MARKER_0, START_MARKER_1, instruction.into()]);
        canonical.extend_from_slice(&self.payload[..len + 2]);
        let valid = crc_matches(&canonical, self.payload[len + 2], self.payload[len + 3]);

        if valid && addr as usize + len > REGISTER_COUNT {
            debug!("Register range 0x{:02X}+{} out of bounds, frame dropped", addr, len);
            self.stats.framing_errors += 1;
            self.reset();
            return None;
        }

        let update = RegisterUpdate {
            addr,
            data: SmallVec::from_slice(&self.payload[2..len + 2]),
        };
        if !self.finish(valid) {
            return None;
        }
        Some(match instruction {
            Instruction::ReadRegister => DecodedEvent::ReadResponse(update),
            _ => DecodedEvent::Feedback(update),
        })
    }

    /// 结束当前帧：计数并复位，返回帧是否有效
    fn finish(&mut self, valid: bool) -> bool {
        if valid {
            self.stats.frames += 1;
        } else {
            trace!("Checksum mismatch, frame dropped: {:02X?}", self.payload);
            self.stats.checksum_errors += 1;
        }
        self.reset();
        valid
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
