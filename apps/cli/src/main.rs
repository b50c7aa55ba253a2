//! # Sortbot CLI
//!
//! Command-line interface for the conveyor sorting robot.
//!
//! ```bash
//! # 配置默认串口
//! sortbot-cli config set --port /dev/ttyUSB0
//!
//! # 单次操作（连接 -> 执行 -> 断开）
//! sortbot-cli info
//! sortbot-cli sort 2
//! sortbot-cli calibrate
//!
//! # 分类结果驱动分拣
//! my-classifier | sortbot-cli run
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::config::SetValues;
use commands::{ConfigCommand, DeviceCommand, MonitorCommand, RunCommand};
use config::CliConfig;

/// Sortbot CLI - 分拣机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "sortbot-cli")]
#[command(about = "Command-line interface for the conveyor sorting robot", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（缺省 <config_dir>/sortbot/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 串口（覆盖配置）
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// 波特率（覆盖配置）
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出可用串口
    Ports,

    #[command(flatten)]
    Device(DeviceCommand),

    /// 监视反馈与报警
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 读取分类结果并自动分拣
    Run {
        #[command(flatten)]
        args: RunCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sortbot_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config =
        CliConfig::load(cli.config.as_deref())?.with_overrides(cli.port.clone(), cli.baud);

    match cli.command {
        Commands::Config(cmd) => {
            let values = SetValues {
                port: cli.port,
                baud: cli.baud,
            };
            cmd.execute(cli.config.as_deref(), &config, values)
        },
        Commands::Ports => commands::ports::execute(),
        Commands::Device(cmd) => cmd.execute(&config),
        Commands::Monitor { args } => args.execute(&config),
        Commands::Run { args } => args.execute(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_device_commands() {
        let cli = Cli::try_parse_from(["sortbot-cli", "sort", "3", "--port", "COM3"]).unwrap();
        assert_eq!(cli.port.as_deref(), Some("COM3"));
        assert!(matches!(
            cli.command,
            Commands::Device(DeviceCommand::Sort { id: 3 })
        ));

        let cli = Cli::try_parse_from(["sortbot-cli", "feedback-freq", "10"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Device(DeviceCommand::FeedbackFreq { hz: 10 })
        ));

        let cli = Cli::try_parse_from(["sortbot-cli", "lock", "off"]).unwrap();
        assert!(matches!(cli.command, Commands::Device(DeviceCommand::Lock { .. })));
    }

    #[test]
    fn test_parse_run() {
        let cli =
            Cli::try_parse_from(["sortbot-cli", "run", "--sample-stride", "2", "-b", "9600"])
                .unwrap();
        assert_eq!(cli.baud, Some(9600));
        match cli.command {
            Commands::Run { args } => assert_eq!(args.sample_stride, Some(2)),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_set_uses_global_flags() {
        let cli = Cli::try_parse_from(["sortbot-cli", "config", "set", "--port", "/dev/ttyUSB0"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommand::Set)));
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn test_sort_id_must_be_numeric() {
        assert!(Cli::try_parse_from(["sortbot-cli", "sort", "kitchen"]).is_err());
    }
}
