//! 寄存器客户端
//!
//! 把高层调用转换为读/写寄存器命令帧，并通过帧解码器维护寄存器镜像。
//!
//! # 读请求模型
//!
//! 协议没有请求/应答关联 ID：任何读应答 (0x03) 都被视为最近一次读请求的应答。
//! 因此同一时刻最多只能有一个未完成的读请求，调用方必须串行化读取。
//! `&mut self` 接收者在类型层面保证了这一点。
//!
//! # 字节接收
//!
//! [`RegisterClient::poll`] 把串口当前所有可用字节交给解码器，
//! 无论是否有调用方在等待应答。主动反馈和报警在任意一次轮询中都会被处理。

use crate::config::ClientConfig;
use crate::error::DriverError;
use crate::hooks::HookManager;
use crate::types::{BinStatus, ExecutionStatus, FirmwareVersion, MacAddress, RegisterRead};
use sortbot_protocol::registers::{calibration, lock};
use sortbot_protocol::*;
use sortbot_serial::SerialAdapter;
use tracing::{debug, trace, warn};

/// 一次轮询的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollResult {
    /// 读取的字节数
    pub bytes: usize,
    /// 解码出的有效帧数
    pub frames: usize,
    /// 是否收到读应答 (0x03)
    pub read_response: bool,
}

/// 寄存器客户端
///
/// # Example
///
/// ```no_run
/// use sortbot_driver::{ClientConfig, RegisterClient};
/// use sortbot_serial::SerialPortAdapter;
///
/// let port = SerialPortAdapter::open("/dev/ttyUSB0", 115_200).unwrap();
/// let mut client = RegisterClient::new(port, ClientConfig::default());
///
/// let version = client.version().unwrap();
/// if let Some(v) = version.fresh() {
///     println!("firmware {}", v);
/// }
/// client.set_sorting(1).unwrap();
/// ```
pub struct RegisterClient<A> {
    adapter: A,
    decoder: FrameDecoder,
    registers: RegisterMap,
    config: ClientConfig,
    hooks: HookManager,
    rx_buf: Vec<u8>,
}

impl<A: SerialAdapter> RegisterClient<A> {
    pub fn new(adapter: A, config: ClientConfig) -> Self {
        Self {
            adapter,
            decoder: FrameDecoder::new(),
            registers: RegisterMap::new(),
            config,
            hooks: HookManager::new(),
            rx_buf: Vec::with_capacity(64),
        }
    }

    // ==================== 读写原语 ====================

    /// 发送读寄存器请求（不等待应答）
    pub fn read_register(&mut self, addr: u8, len: u8) -> Result<(), DriverError> {
        if addr as usize + len as usize > REGISTER_COUNT {
            return Err(ProtocolError::RegisterOverflow {
                addr,
                len: len as usize,
            }
            .into());
        }
        self.send(&ReadRegisterCommand::new(addr, len).to_bytes())
    }

    /// 发送多字节写寄存器请求
    pub fn write_register(&mut self, addr: u8, data: &[u8]) -> Result<(), DriverError> {
        let command = WriteRegisterCommand::new(addr, data)?;
        self.send(&command.to_bytes())
    }

    /// 发送单字节写寄存器请求
    pub fn write_register_byte(&mut self, addr: u8, value: u8) -> Result<(), DriverError> {
        self.send(&WriteRegisterCommand::single(addr, value).to_bytes())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), DriverError> {
        trace!("TX {:02X?}", bytes);
        self.adapter.write_all(bytes)?;
        self.hooks.trigger_sent(bytes);
        Ok(())
    }

    /// 把串口当前所有可用字节交给解码器
    pub fn poll(&mut self) -> Result<PollResult, DriverError> {
        self.rx_buf.clear();
        let bytes = self.adapter.drain_into(&mut self.rx_buf)?;

        let mut result = PollResult {
            bytes,
            ..PollResult::default()
        };
        for &byte in self.rx_buf.iter() {
            let Some(event) = self.decoder.feed_into(byte, &mut self.registers) else {
                continue;
            };
            result.frames += 1;
            match &event {
                DecodedEvent::ReadResponse(update) => {
                    debug!("Read response 0x{:02X}: {:02X?}", update.addr, update.data);
                    result.read_response = true;
                },
                DecodedEvent::Feedback(update) => {
                    debug!("Feedback 0x{:02X}: {:02X?}", update.addr, update.data);
                },
                DecodedEvent::Alarm(alarm) => {
                    warn!("ALARM! level: {}, type: {}", alarm.level, alarm.kind);
                },
            }
            self.hooks.trigger_event(&event);
        }
        Ok(result)
    }

    /// 等待读应答
    ///
    /// 最多轮询 `response_attempts` 次，每次之前等待 `response_interval`；
    /// 收到任意读应答立即返回 `true`，预算耗尽返回 `false`。
    /// 等待期间收到的其它字节照常解码。
    pub fn await_response(&mut self) -> Result<bool, DriverError> {
        for _ in 0..self.config.response_attempts {
            spin_sleep::sleep(self.config.response_interval);
            if self.poll()?.read_response {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 读取并投影寄存器镜像
    fn read_with<T>(
        &mut self,
        addr: u8,
        len: u8,
        project: impl FnOnce(&RegisterMap) -> T,
    ) -> Result<RegisterRead<T>, DriverError> {
        self.read_register(addr, len)?;
        let responded = self.await_response()?;
        let value = project(&self.registers);
        if responded {
            Ok(RegisterRead::Fresh(value))
        } else {
            warn!("Cannot get response from robot (register 0x{:02X})", addr);
            Ok(RegisterRead::Stale(value))
        }
    }

    // ==================== 读取 ====================

    /// 设备类型
    pub fn device_code(&mut self) -> Result<RegisterRead<u8>, DriverError> {
        self.read_with(REG_DEVICE_TYPE, 1, |r| r.get(REG_DEVICE_TYPE))
    }

    /// 固件版本
    pub fn version(&mut self) -> Result<RegisterRead<FirmwareVersion>, DriverError> {
        self.read_with(REG_VERSION, 1, |r| FirmwareVersion(r.get(REG_VERSION)))
    }

    /// MAC 地址
    pub fn mac_address(&mut self) -> Result<RegisterRead<MacAddress>, DriverError> {
        self.read_with(REG_MAC, MAC_LEN, |r| MacAddress(r.array::<6>(REG_MAC)))
    }

    /// 设备 ID（0-255）
    pub fn device_id(&mut self) -> Result<RegisterRead<u8>, DriverError> {
        self.read_with(REG_DEVICE_ID, 1, |r| r.get(REG_DEVICE_ID))
    }

    /// 4 个拨杆的零位偏移角（0-223）
    pub fn lever_offsets(&mut self) -> Result<RegisterRead<[u8; 4]>, DriverError> {
        self.read_with(REG_LEVER_OFFSET, LEVER_COUNT, |r| {
            r.array::<4>(REG_LEVER_OFFSET)
        })
    }

    /// 执行状态
    pub fn execution_status(&mut self) -> Result<RegisterRead<ExecutionStatus>, DriverError> {
        self.read_with(REG_EXECUTION_STATUS, 1, |r| {
            ExecutionStatus::from(r.get(REG_EXECUTION_STATUS))
        })
    }

    /// 垃圾桶满载状态
    pub fn bin_status(&mut self) -> Result<RegisterRead<BinStatus>, DriverError> {
        self.read_with(REG_BIN_STATUS, 1, |r| BinStatus(r.get(REG_BIN_STATUS)))
    }

    // ==================== 设置（不等待应答） ====================

    /// EEPROM 写锁：`true` 上锁（保护 EEPROM），`false` 解锁（允许写入）
    pub fn set_lock(&mut self, locked: bool) -> Result<(), DriverError> {
        let value = if locked { lock::LOCKED } else { lock::UNLOCKED };
        self.write_register_byte(REG_EEPROM_LOCK, value)
    }

    /// 分拣指令：0 停止，1..=4 分拣 ID
    pub fn set_sorting(&mut self, sorting_id: u8) -> Result<(), DriverError> {
        if sorting_id > MAX_SORTING_ID {
            return Err(ProtocolError::InvalidValue {
                field: "sorting_id".to_string(),
                value: sorting_id,
            }
            .into());
        }
        self.write_register_byte(REG_SORTING, sorting_id)
    }

    /// 按键使能
    pub fn set_button_enable(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.write_register_byte(REG_BUTTON_ENABLE, enabled as u8)
    }

    /// 自动反馈频率（Hz），0 关闭反馈
    pub fn set_feedback_frequency(&mut self, hz: u8) -> Result<(), DriverError> {
        self.write_register_byte(REG_FEEDBACK_FREQUENCY, hz)
    }

    /// 清除零位偏移
    pub fn clear_offsets(&mut self) -> Result<(), DriverError> {
        self.write_register_byte(REG_OFFSET_CALIBRATION, calibration::CLEAR)
    }

    /// 拨杆卸力
    pub fn lever_release(&mut self) -> Result<(), DriverError> {
        self.write_register_byte(REG_OFFSET_CALIBRATION, calibration::RELEASE)
    }

    /// 以当前拨杆位置标定零位偏移
    ///
    /// 解锁 EEPROM → 等待 → 触发标定 → 等待 → 重新上锁。
    /// 两次等待是 EEPROM 写周期要求的稳定时间。
    pub fn calibrate_offsets(&mut self) -> Result<(), DriverError> {
        self.set_lock(false)?;
        spin_sleep::sleep(self.config.eeprom_settle);
        self.write_register_byte(REG_OFFSET_CALIBRATION, calibration::CALIBRATE)?;
        spin_sleep::sleep(self.config.eeprom_settle);
        self.set_lock(true)
    }

    // ==================== 访问器 ====================

    /// 寄存器镜像（最新已知值）
    pub fn registers(&self) -> &RegisterMap {
        &self.registers
    }

    /// 解码统计
    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn hooks_mut(&mut self) -> &mut HookManager {
        &mut self.hooks
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    /// 取回底层适配器
    pub fn into_adapter(self) -> A {
        self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbot_serial::{MockDevice, MockSerialAdapter};
    use std::time::Duration;

    fn fast_config() -> ClientConfig {
        ClientConfig {
            response_attempts: 3,
            response_interval: Duration::ZERO,
            eeprom_settle: Duration::ZERO,
        }
    }

    fn setup() -> (RegisterClient<MockSerialAdapter>, MockDevice) {
        let (adapter, device) = MockSerialAdapter::new();
        (RegisterClient::new(adapter, fast_config()), device)
    }

    #[test]
    fn test_read_register_frame() {
        let (mut client, device) = setup();
        device.set_responding(false);
        client.read_register(REG_MAC, MAC_LEN).unwrap();
        assert_eq!(
            device.written(),
            ReadRegisterCommand::new(2, 6).to_bytes().to_vec()
        );
    }

    #[test]
    fn test_read_register_rejects_overflow() {
        let (mut client, device) = setup();
        assert!(matches!(
            client.read_register(250, 10),
            Err(DriverError::Protocol(ProtocolError::RegisterOverflow { .. }))
        ));
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_write_register_multi() {
        let (mut client, device) = setup();
        client.write_register(REG_LEVER_OFFSET, &[1, 2, 3, 4]).unwrap();
        assert_eq!(device.register(13), 1);
        assert_eq!(device.register(16), 4);
    }

    #[test]
    fn test_getter_fresh() {
        let (mut client, device) = setup();
        device.set_registers(REG_VERSION, &[23]);
        let version = client.version().unwrap();
        assert_eq!(version, RegisterRead::Fresh(FirmwareVersion(23)));
        assert_eq!(client.registers().get(REG_VERSION), 23);
    }

    #[test]
    fn test_getter_stale_on_timeout() {
        let (mut client, device) = setup();
        device.set_registers(REG_DEVICE_ID, &[5]);
        assert_eq!(client.device_id().unwrap(), RegisterRead::Fresh(5));

        device.set_registers(REG_DEVICE_ID, &[9]);
        device.set_responding(false);
        assert_eq!(client.device_id().unwrap(), RegisterRead::Stale(5));
    }

    #[test]
    fn test_await_response_within_budget() {
        let (mut client, device) = setup();
        device.set_response_delay(2);
        device.set_registers(REG_BIN_STATUS, &[0b10]);
        let status = client.bin_status().unwrap();
        assert!(status.is_fresh());
        assert!(status.into_inner().is_full(1));
    }

    #[test]
    fn test_await_response_budget_exhausted() {
        let (mut client, device) = setup();
        // 3 次轮询预算，应答在第 5 次读尝试才出现
        device.set_response_delay(4);
        assert!(!client.device_code().unwrap().is_fresh());
    }

    #[test]
    fn test_feedback_does_not_satisfy_read() {
        let (mut client, device) = setup();
        device.set_responding(false);
        device.inject_feedback(REG_EXECUTION_STATUS, &[1]);
        let status = client.execution_status().unwrap();
        assert_eq!(status, RegisterRead::Stale(ExecutionStatus::InProgress));
    }

    #[test]
    fn test_poll_reports_frames() {
        let (mut client, device) = setup();
        device.inject_feedback(REG_EXECUTION_STATUS, &[1]);
        device.inject_alarm(1, 3);
        let result = client.poll().unwrap();
        assert_eq!(result.frames, 2);
        assert!(!result.read_response);
        assert_eq!(client.decoder_stats().frames, 2);
        assert_eq!(client.poll().unwrap(), PollResult::default());
    }

    #[test]
    fn test_set_sorting_range() {
        let (mut client, device) = setup();
        client.set_sorting(4).unwrap();
        client.set_sorting(0).unwrap();
        assert!(matches!(
            client.set_sorting(5),
            Err(DriverError::Protocol(ProtocolError::InvalidValue { value: 5, .. }))
        ));
        assert_eq!(device.writes_to(REG_SORTING), vec![4, 0]);
    }

    #[test]
    fn test_setters() {
        let (mut client, device) = setup();
        client.set_button_enable(true).unwrap();
        client.set_feedback_frequency(20).unwrap();
        client.clear_offsets().unwrap();
        client.lever_release().unwrap();
        assert_eq!(device.writes_to(REG_BUTTON_ENABLE), vec![1]);
        assert_eq!(device.writes_to(REG_FEEDBACK_FREQUENCY), vec![20]);
        assert_eq!(device.writes_to(REG_OFFSET_CALIBRATION), vec![2, 3]);
    }

    #[test]
    fn test_calibrate_sequence() {
        let (mut client, device) = setup();
        client.calibrate_offsets().unwrap();
        let writes: Vec<(u8, u8)> = device
            .host_frames()
            .iter()
            .map(|f| (f.addr, f.data[0]))
            .collect();
        assert_eq!(
            writes,
            vec![(REG_EEPROM_LOCK, 0), (REG_OFFSET_CALIBRATION, 1), (REG_EEPROM_LOCK, 1)]
        );
    }

    #[test]
    fn test_transport_error_propagates() {
        let (mut client, device) = setup();
        device.disconnect();
        assert!(matches!(
            client.set_sorting(1),
            Err(DriverError::Serial(sortbot_serial::SerialError::Disconnected))
        ));
        assert!(client.poll().is_err());
    }
}
