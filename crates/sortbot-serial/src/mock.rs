//! Mock 串口与模拟设备
//!
//! [`MockSerialAdapter`] 与 [`MockDevice`] 共享同一份状态：
//! 适配器交给被测代码，设备句柄留在测试中用于注入字节、检查写入内容。
//!
//! 模拟设备持有自己的寄存器表，会像真实机器人一样：
//! - 对读请求 (0x03) 回复读应答
//! - 对写请求 (0x04) 更新寄存器
//!
//! 应答可以关闭（模拟无响应）或延迟若干次轮询后才出现（模拟串口延迟）。

use crate::{SerialAdapter, SerialError};
use parking_lot::Mutex;
use sortbot_protocol::{
    FrameBytes, Instruction, REGISTER_COUNT, START_MARKER_0, START_MARKER_1, crc_matches, seal,
    seal_alarm,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// 主机写入的一帧（已按协议拆分）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFrame {
    pub instruction: u8,
    pub addr: u8,
    pub len: u8,
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct DeviceState {
    /// 设备 -> 主机（尚未被读取）
    rx: VecDeque<u8>,
    /// 已写入但尚未"到达"的应答，`ready_after` 次空读之后才进入 rx
    pending: VecDeque<(u32, FrameBytes)>,
    /// 主机 -> 设备的原始字节
    written: Vec<u8>,
    /// 已解析的主机帧
    frames: Vec<HostFrame>,
    registers: [u8; REGISTER_COUNT],
    respond: bool,
    response_delay_polls: u32,
    disconnected: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            rx: VecDeque::new(),
            pending: VecDeque::new(),
            written: Vec::new(),
            frames: Vec::new(),
            registers: [0; REGISTER_COUNT],
            respond: true,
            response_delay_polls: 0,
            disconnected: false,
        }
    }
}

impl DeviceState {
    fn handle_host_bytes(&mut self, bytes: &[u8]) {
        self.written.extend_from_slice(bytes);
        let Some(frame) = parse_host_frame(bytes) else {
            trace!("Mock device ignored malformed host bytes {:02X?}", bytes);
            return;
        };

        match Instruction::try_from(frame.instruction) {
            Ok(Instruction::ReadRegister) if self.respond => {
                let start = frame.addr as usize;
                let end = (start + frame.len as usize).min(REGISTER_COUNT);
                let data = &self.registers[start..end];
                let response = seal(Instruction::ReadRegister, frame.addr, data.len() as u8, data);
                self.pending.push_back((self.response_delay_polls, response));
            },
            Ok(Instruction::WriteRegister) => {
                let start = frame.addr as usize;
                let end = (start + frame.data.len()).min(REGISTER_COUNT);
                self.registers[start..end].copy_from_slice(&frame.data[..end - start]);
            },
            _ => {},
        }
        self.frames.push(frame);
    }

    /// 一次读取尝试：rx 为空时推进延迟计数
    fn poll_pending(&mut self) {
        if !self.rx.is_empty() {
            return;
        }
        if let Some((remaining, _)) = self.pending.front_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return;
            }
        }
        if let Some((_, bytes)) = self.pending.pop_front() {
            self.rx.extend(bytes);
        }
    }
}

/// 解析一个完整的主机帧（读请求或写请求），CRC 不通过时返回 `None`
fn parse_host_frame(bytes: &[u8]) -> Option<HostFrame> {
    if bytes.len() < 7 || bytes[0] != START_MARKER_0 || bytes[1] != START_MARKER_1 {
        return None;
    }
    let (body, crc) = bytes.split_at(bytes.len() - 2);
    if !crc_matches(body, crc[0], crc[1]) {
        return None;
    }
    let (instruction, addr, len) = (body[2], body[3], body[4]);
    Some(HostFrame {
        instruction,
        addr,
        len,
        data: body[5..].to_vec(),
    })
}

/// 测试侧的设备句柄
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建连接到此设备的串口适配器
    pub fn adapter(&self) -> MockSerialAdapter {
        MockSerialAdapter {
            state: Arc::clone(&self.state),
        }
    }

    /// 设置设备寄存器（不产生任何串口流量）
    pub fn set_registers(&self, addr: u8, values: &[u8]) {
        let mut state = self.state.lock();
        let start = addr as usize;
        state.registers[start..start + values.len()].copy_from_slice(values);
    }

    /// 读取设备寄存器
    pub fn register(&self, addr: u8) -> u8 {
        self.state.lock().registers[addr as usize]
    }

    /// 是否应答读请求
    pub fn set_responding(&self, respond: bool) {
        self.state.lock().respond = respond;
    }

    /// 应答在多少次空读之后才可见
    pub fn set_response_delay(&self, polls: u32) {
        self.state.lock().response_delay_polls = polls;
    }

    /// 模拟串口断开
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    /// 注入原始字节（设备 -> 主机）
    pub fn inject(&self, bytes: &[u8]) {
        self.state.lock().rx.extend(bytes.iter().copied());
    }

    /// 注入一帧主动反馈，同时更新设备寄存器
    pub fn inject_feedback(&self, addr: u8, data: &[u8]) {
        self.set_registers(addr, data);
        self.inject(&seal(Instruction::Feedback, addr, data.len() as u8, data));
    }

    /// 注入一帧报警
    pub fn inject_alarm(&self, level: u8, kind: u8) {
        self.inject(&seal_alarm(level, kind));
    }

    /// 主机写入的全部原始字节
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// 主机写入的已解析帧
    pub fn host_frames(&self) -> Vec<HostFrame> {
        self.state.lock().frames.clone()
    }

    /// 主机对某个寄存器发出的写入值序列
    pub fn writes_to(&self, addr: u8) -> Vec<u8> {
        self.state
            .lock()
            .frames
            .iter()
            .filter(|f| f.instruction == u8::from(Instruction::WriteRegister) && f.addr == addr)
            .filter_map(|f| f.data.first().copied())
            .collect()
    }

    /// 清空写入记录
    pub fn clear_written(&self) {
        let mut state = self.state.lock();
        state.written.clear();
        state.frames.clear();
    }

    /// 尚未被主机读取的字节数
    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx.len()
    }
}

/// 连接到 [`MockDevice`] 的串口适配器
#[derive(Debug, Clone)]
pub struct MockSerialAdapter {
    state: Arc<Mutex<DeviceState>>,
}

impl MockSerialAdapter {
    /// 创建适配器及其设备句柄
    pub fn new() -> (Self, MockDevice) {
        let device = MockDevice::new();
        (device.adapter(), device)
    }
}

impl SerialAdapter for MockSerialAdapter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(SerialError::Disconnected);
        }
        state.handle_host_bytes(bytes);
        Ok(())
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(SerialError::Disconnected);
        }
        state.poll_pending();
        Ok(state.rx.pop_front())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
