//! 命令定义和实现

pub mod config;
pub mod device;
pub mod monitor;
pub mod ports;
pub mod run;

pub use config::ConfigCommand;
pub use device::DeviceCommand;
pub use monitor::MonitorCommand;
pub use run::RunCommand;

use crate::config::CliConfig;
use anyhow::Result;
use sortbot_driver::{RegisterClient, SorterBuilder};
use sortbot_serial::{DEFAULT_BAUD_RATE, SerialPortAdapter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 按配置打开串口
pub fn connect(config: &CliConfig) -> Result<RegisterClient<SerialPortAdapter>> {
    let port = config.require_port()?;
    let baud_rate = config.baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    println!("🔌 连接到 {} ({} baud)...", port, baud_rate);

    let client = SorterBuilder::new(port)
        .baud_rate(baud_rate)
        .client_config(config.link.client_config())
        .build()?;
    Ok(client)
}

/// 安装 Ctrl-C 处理器，返回运行标志
pub fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
