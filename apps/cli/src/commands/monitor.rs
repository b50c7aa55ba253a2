//! 监视串口上的反馈与报警

use super::{connect, interrupt_flag};
use crate::config::CliConfig;
use anyhow::Result;
use clap::Args;
use sortbot_driver::{BinStatus, ChannelEventHook, ExecutionStatus};
use sortbot_protocol::{DecodedEvent, REG_BIN_STATUS, REG_EXECUTION_STATUS, RegisterUpdate};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// 监视时长（秒），缺省直到 Ctrl-C
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// 开始前设置主动反馈频率（Hz）
    #[arg(long)]
    pub feedback_hz: Option<u8>,
}

impl MonitorCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let running = interrupt_flag()?;
        let mut client = connect(config)?;

        let (hook, events) = ChannelEventHook::new(1024);
        let dropped = hook.dropped_events().clone();
        client.hooks_mut().add_callback(Arc::new(hook));

        if let Some(hz) = self.feedback_hz {
            client.set_feedback_frequency(hz)?;
        }

        let deadline = self.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
        println!("👀 监视中（Ctrl-C 退出）...");

        while running.load(Ordering::SeqCst) && deadline.is_none_or(|d| Instant::now() < d) {
            client.poll()?;
            for event in events.try_iter() {
                println!("{}", describe(&event));
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        let stats = client.decoder_stats();
        println!(
            "📊 帧: {}  校验错误: {}  帧格式错误: {}  丢弃事件: {}",
            stats.frames,
            stats.checksum_errors,
            stats.framing_errors,
            dropped.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

fn describe(event: &DecodedEvent) -> String {
    match event {
        DecodedEvent::ReadResponse(update) => format!("📥 读应答 {}", describe_update(update)),
        DecodedEvent::Feedback(update) => format!("📡 反馈   {}", describe_update(update)),
        DecodedEvent::Alarm(alarm) => {
            format!("🚨 报警   level={} type={}", alarm.level, alarm.kind)
        },
    }
}

fn describe_update(update: &RegisterUpdate) -> String {
    let mut text = format!("[0x{:02X}] {:02X?}", update.addr, update.data.as_slice());
    for (offset, &value) in update.data.iter().enumerate() {
        match update.addr as usize + offset {
            addr if addr == REG_EXECUTION_STATUS as usize => {
                text.push_str(&format!(" exec={:?}", ExecutionStatus::from(value)));
            },
            addr if addr == REG_BIN_STATUS as usize => {
                let full: Vec<u8> = BinStatus(value).full_bins().collect();
                text.push_str(&format!(" full_bins={:?}", full));
            },
            _ => {},
        }
    }
    text
}
