//! 配置管理命令

use crate::config::{CliConfig, default_config_file};
use anyhow::{Result, bail};
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置
    Show,

    /// 显示配置文件路径
    Path,

    /// 写入默认配置文件
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 把 --port / --baud 保存为默认值
    Set,
}

/// `config set` 要保存的值（来自全局参数）
#[derive(Debug, Default)]
pub struct SetValues {
    pub port: Option<String>,
    pub baud: Option<u32>,
}

impl ConfigCommand {
    pub fn execute(
        self,
        explicit: Option<&Path>,
        effective: &CliConfig,
        values: SetValues,
    ) -> Result<()> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => default_config_file()?,
        };

        match self {
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(effective)?);
                Ok(())
            },
            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
            ConfigCommand::Init { force } => Self::init_(&path, force),
            ConfigCommand::Set => Self::set_(&path, values),
        }
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        CliConfig::default().save_to(path)?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn set_(path: &Path, values: SetValues) -> Result<()> {
        if values.port.is_none() && values.baud.is_none() {
            bail!("至少需要 --port 或 --baud 之一");
        }
        let mut config = if path.exists() {
            CliConfig::load_from(path)?
        } else {
            CliConfig::default()
        };

        if let Some(port) = values.port {
            println!("✅ 设置默认串口: {}", port);
            config.port = Some(port);
        }
        if let Some(baud) = values.baud {
            println!("✅ 设置波特率: {}", baud);
            config.baud_rate = Some(baud);
        }
        config.save_to(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let values = SetValues {
            port: Some("/dev/ttyUSB1".into()),
            baud: None,
        };
        ConfigCommand::Set
            .execute(Some(&path), &CliConfig::default(), values)
            .unwrap();
        assert_eq!(
            CliConfig::load_from(&path).unwrap().port.as_deref(),
            Some("/dev/ttyUSB1")
        );

        let result = ConfigCommand::Init { force: false }.execute(
            Some(&path),
            &CliConfig::default(),
            SetValues::default(),
        );
        assert!(result.is_err());

        ConfigCommand::Init { force: true }
            .execute(Some(&path), &CliConfig::default(), SetValues::default())
            .unwrap();
        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_set_requires_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let result =
            ConfigCommand::Set.execute(Some(&path), &CliConfig::default(), SetValues::default());
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
