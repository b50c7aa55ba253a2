//! 真实串口适配器（`serialport` crate）

use crate::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, SerialAdapter, SerialError};
use serialport::{SerialPort, SerialPortType};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// 可用串口信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// 端口名（如 `/dev/ttyUSB0`、`COM3`）
    pub name: String,
    /// 端口类型描述
    pub kind: String,
}

/// 列出系统中的串口
pub fn available_ports() -> Result<Vec<PortInfo>, SerialError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            kind: describe_port_type(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => match &usb.product {
            Some(product) => format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, product),
            None => format!("USB {:04x}:{:04x}", usb.vid, usb.pid),
        },
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}

/// 基于 `serialport` 的串口适配器
///
/// # Example
///
/// ```no_run
/// use sortbot_serial::{SerialAdapter, SerialPortAdapter};
///
/// let mut port = SerialPortAdapter::open("/dev/ttyUSB0", 115_200).unwrap();
/// port.write_all(&[0xAA, 0x77]).unwrap();
/// ```
pub struct SerialPortAdapter {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialPortAdapter {
    /// 以默认读超时打开串口
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, SerialError> {
        Self::open_with_timeout(path, baud_rate, DEFAULT_READ_TIMEOUT)
    }

    /// 打开串口
    pub fn open_with_timeout(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, SerialError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => SerialError::NotFound(path.to_string()),
                _ => SerialError::Port(e),
            })?;
        debug!("Serial port {} opened at {} baud", path, baud_rate);
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    /// 以默认波特率打开串口
    pub fn open_default(path: &str) -> Result<Self, SerialError> {
        Self::open(path, DEFAULT_BAUD_RATE)
    }

    fn available(&self) -> Result<usize, SerialError> {
        Ok(self.port.bytes_to_read()? as usize)
    }
}

impl SerialAdapter for SerialPortAdapter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        trace!("TX {:02X?}", bytes);
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        if self.available()? == 0 {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Err(SerialError::Disconnected),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn drain_into(&mut self, out: &mut Vec<u8>) -> Result<usize, SerialError> {
        let available = self.available()?;
        if available == 0 {
            return Ok(0);
        }
        let start = out.len();
        out.resize(start + available, 0);
        let read = match self.port.read(&mut out[start..]) {
            Ok(0) => {
                out.truncate(start);
                return Err(SerialError::Disconnected);
            },
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(e) => {
                out.truncate(start);
                return Err(e.into());
            },
        };
        out.truncate(start + read);
        trace!("RX {:02X?}", &out[start..]);
        Ok(read)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
