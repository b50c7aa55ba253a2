//! 单次设备操作命令
//!
//! 每条命令：连接 -> 执行 -> 断开。

use super::connect;
use crate::config::CliConfig;
use anyhow::{Result, ensure};
use clap::{Subcommand, ValueEnum};
use sortbot_driver::{RegisterClient, RegisterRead};
use sortbot_protocol::MAX_SORTING_ID;
use sortbot_serial::SerialAdapter;
use std::fmt::Display;

/// 开关状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        self == Switch::On
    }
}

#[derive(Subcommand, Debug)]
pub enum DeviceCommand {
    /// 读取设备信息（类型、版本、MAC、ID、拨杆偏移）
    Info,

    /// 读取执行状态与垃圾桶状态
    Status,

    /// 手动分拣到指定垃圾桶（0 = 回到待机）
    Sort {
        /// 分拣 ID（0-4）
        id: u8,
    },

    /// 标定拨杆偏移（解锁 EEPROM -> 标定 -> 上锁）
    Calibrate,

    /// 清除拨杆偏移
    ClearOffsets,

    /// 释放拨杆
    Release,

    /// EEPROM 写锁
    Lock {
        #[arg(value_enum)]
        state: Switch,
    },

    /// 按键使能
    Button {
        #[arg(value_enum)]
        state: Switch,
    },

    /// 设置主动反馈频率（Hz）
    FeedbackFreq { hz: u8 },
}

impl DeviceCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        // 参数检查放在连接之前
        if let DeviceCommand::Sort { id } = &self {
            ensure!(
                *id <= MAX_SORTING_ID,
                "分拣 ID 必须在 0-{} 之间，当前: {}",
                MAX_SORTING_ID,
                id
            );
        }

        let mut client = connect(config)?;
        self.run(&mut client)
    }

    fn run<A: SerialAdapter>(self, client: &mut RegisterClient<A>) -> Result<()> {
        match self {
            DeviceCommand::Info => {
                show("设备类型", client.device_code()?.map(|code| format!("0x{:02X}", code)));
                show("固件版本", client.version()?);
                show("MAC", client.mac_address()?);
                show("设备 ID", client.device_id()?);
                show(
                    "拨杆偏移",
                    client.lever_offsets()?.map(|offsets| format!("{:?}", offsets)),
                );
            },
            DeviceCommand::Status => {
                show(
                    "执行状态",
                    client.execution_status()?.map(|status| format!("{:?}", status)),
                );
                show(
                    "满载垃圾桶",
                    client
                        .bin_status()?
                        .map(|bins| format!("{:?}", bins.full_bins().collect::<Vec<_>>())),
                );
            },
            DeviceCommand::Sort { id } => {
                client.set_sorting(id)?;
                println!("✅ 分拣 ID 已设置为 {}", id);
            },
            DeviceCommand::Calibrate => {
                println!("⏳ 标定拨杆偏移...");
                client.calibrate_offsets()?;
                println!("✅ 标定完成");
            },
            DeviceCommand::ClearOffsets => {
                client.clear_offsets()?;
                println!("✅ 偏移已清除");
            },
            DeviceCommand::Release => {
                client.lever_release()?;
                println!("✅ 拨杆已释放");
            },
            DeviceCommand::Lock { state } => {
                client.set_lock(state.is_on())?;
                println!("✅ EEPROM 写锁: {:?}", state);
            },
            DeviceCommand::Button { state } => {
                client.set_button_enable(state.is_on())?;
                println!("✅ 按键使能: {:?}", state);
            },
            DeviceCommand::FeedbackFreq { hz } => {
                client.set_feedback_frequency(hz)?;
                println!("✅ 反馈频率: {} Hz", hz);
            },
        }
        Ok(())
    }
}

/// 打印读取结果，超时的值标注为缓存
fn show<T: Display>(label: &str, value: RegisterRead<T>) {
    match value {
        RegisterRead::Fresh(v) => println!("{:<10} {}", label, v),
        RegisterRead::Stale(v) => println!("{:<10} {}  ⚠️ 无应答（缓存值）", label, v),
    }
}
