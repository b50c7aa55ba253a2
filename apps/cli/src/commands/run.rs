//! 分拣主循环
//!
//! 从标准输入（或文件）逐行读取分类结果 `class_id probability`，
//! 经去抖状态机后驱动分拣寄存器。输入停顿时仍按时结束分拣。

use super::{connect, interrupt_flag};
use crate::config::CliConfig;
use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use sortbot_client::{ClassificationSample, SortingCommand, SortingController};
use sortbot_serial::SerialAdapter;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

const TICK_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Args, Debug)]
pub struct RunCommand {
    /// 分类结果输入文件（缺省读标准输入）
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// 覆盖配置中的抽样步长
    #[arg(long)]
    pub sample_stride: Option<u32>,
}

impl RunCommand {
    pub fn execute(&self, config: &CliConfig) -> Result<()> {
        let mut decision = config.decision.clone();
        if let Some(stride) = self.sample_stride {
            decision.sample_stride = stride;
        }

        let reader: Box<dyn BufRead + Send> = match &self.input {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("打开输入失败: {}", path.display()))?,
            )),
            None => Box::new(BufReader::new(std::io::stdin())),
        };

        let running = interrupt_flag()?;
        let client = connect(config)?;
        let mut controller = SortingController::new(client, decision)?;

        // 输入线程：阻塞读行，主线程负责超时推进
        let (tx, rx) = bounded::<String>(64);
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        println!("▶️ 分拣运行中（Ctrl-C 退出）...");
        drive(&mut controller, &rx, &running)
    }
}

/// 分拣主循环
///
/// 收到样本即处理，无输入时按 `TICK_INTERVAL` 推进计时。
/// 输入结束后继续推进，直到当前分拣按时结束；只有中断时才立即写 0。
pub fn drive<A: SerialAdapter>(
    controller: &mut SortingController<A>,
    lines: &Receiver<String>,
    running: &AtomicBool,
) -> Result<()> {
    let mut input_open = true;
    while running.load(Ordering::SeqCst) {
        let command = if input_open {
            match lines.recv_timeout(TICK_INTERVAL) {
                Ok(line) => match parse_sample(&line) {
                    Ok(Some(sample)) => controller.on_classification(sample)?,
                    Ok(None) => controller.tick()?,
                    Err(e) => {
                        warn!("Skipping input line {:?}: {}", line, e);
                        controller.tick()?
                    },
                },
                Err(RecvTimeoutError::Timeout) => controller.tick()?,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Input closed");
                    input_open = false;
                    controller.tick()?
                },
            }
        } else if controller.state().is_idle() {
            return Ok(());
        } else {
            std::thread::sleep(TICK_INTERVAL);
            controller.tick()?
        };
        if let Some(command) = command {
            report(command);
        }
    }

    if let Some(command) = controller.abort()? {
        report(command);
    }
    Ok(())
}

fn report(command: SortingCommand) {
    match command {
        SortingCommand::Start(category) => println!("🗑️ 开始分拣 {}", category),
        SortingCommand::Stop => println!("⏹️ 分拣结束"),
    }
}

/// 解析一行分类结果
///
/// 空行与 `#` 注释返回 `Ok(None)`；字段以空白或逗号分隔。
pub fn parse_sample(line: &str) -> Result<Option<ClassificationSample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|field| !field.is_empty());
    let class_id = fields.next().ok_or_else(|| anyhow!("missing class id"))?;
    let probability = fields.next().ok_or_else(|| anyhow!("missing probability"))?;
    if fields.next().is_some() {
        bail!("expected two fields");
    }

    let class_id: u8 = class_id
        .parse()
        .with_context(|| format!("invalid class id {:?}", class_id))?;
    let probability: u8 = probability
        .parse()
        .with_context(|| format!("invalid probability {:?}", probability))?;
    if probability > 100 {
        bail!("probability {} exceeds 100", probability);
    }
    Ok(Some(ClassificationSample::new(class_id, probability)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbot_client::{CategoryDurations, DecisionConfig};
    use sortbot_driver::{ClientConfig, RegisterClient};
    use sortbot_protocol::REG_SORTING;
    use sortbot_serial::{MockDevice, MockSerialAdapter};
    use std::time::Instant;

    fn controller(recyclable_ms: u64) -> (SortingController<MockSerialAdapter>, MockDevice) {
        let (adapter, device) = MockSerialAdapter::new();
        let client = RegisterClient::new(adapter, ClientConfig::default());
        let decision = DecisionConfig {
            durations: CategoryDurations {
                recyclable_ms,
                ..CategoryDurations::default()
            },
            ..DecisionConfig::default()
        };
        (SortingController::new(client, decision).unwrap(), device)
    }

    #[test]
    fn test_input_eof_lets_motion_finish() {
        let (mut controller, device) = controller(200);
        let (tx, rx) = bounded(64);
        for _ in 0..19 {
            tx.send("1 90".to_string()).unwrap();
        }
        drop(tx);

        let start = Instant::now();
        drive(&mut controller, &rx, &AtomicBool::new(true)).unwrap();

        assert!(start.elapsed() > Duration::from_millis(200));
        assert_eq!(device.writes_to(REG_SORTING), vec![1, 0]);
        assert!(controller.state().is_idle());
    }

    #[test]
    fn test_input_eof_when_idle_returns_at_once() {
        let (mut controller, device) = controller(200);
        let (tx, rx) = bounded::<String>(1);
        drop(tx);

        let start = Instant::now();
        drive(&mut controller, &rx, &AtomicBool::new(true)).unwrap();
        assert!(start.elapsed() < Duration::from_millis(200));
        assert!(device.writes_to(REG_SORTING).is_empty());
    }

    #[test]
    fn test_interrupt_stops_motion_immediately() {
        let (mut controller, device) = controller(60_000);
        let now = Instant::now();
        for _ in 0..19 {
            controller
                .on_classification_at(ClassificationSample::new(1, 90), now)
                .unwrap();
        }
        let (_tx, rx) = bounded::<String>(1);

        drive(&mut controller, &rx, &AtomicBool::new(false)).unwrap();
        assert_eq!(device.writes_to(REG_SORTING), vec![1, 0]);
        assert!(controller.state().is_idle());
    }

    #[test]
    fn test_parse_sample() {
        assert_eq!(
            parse_sample("1 90").unwrap(),
            Some(ClassificationSample::new(1, 90))
        );
        assert_eq!(
            parse_sample("  3,\t87 ").unwrap(),
            Some(ClassificationSample::new(3, 87))
        );
        assert_eq!(parse_sample("").unwrap(), None);
        assert_eq!(parse_sample("# camera warming up").unwrap(), None);
    }

    #[test]
    fn test_parse_sample_rejects_garbage() {
        assert!(parse_sample("1").is_err());
        assert!(parse_sample("1 90 3").is_err());
        assert!(parse_sample("one 90").is_err());
        assert!(parse_sample("1 101").is_err());
        assert!(parse_sample("-1 50").is_err());
    }
}
