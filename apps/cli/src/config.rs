//! CLI 配置文件
//!
//! 默认位置 `<config_dir>/sortbot/config.toml`，可用 `--config` 指定。
//! 命令行参数（`--port`、`--baud`）优先于配置文件。

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use sortbot_client::DecisionConfig;
use sortbot_driver::ClientConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow!("无法确定配置目录"))?;
    path.push("sortbot");
    path.push("config.toml");
    Ok(path)
}

/// 串口链路参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// 等待读应答的轮询次数
    pub response_attempts: u32,
    /// 轮询间隔（毫秒）
    pub response_interval_ms: u64,
    /// EEPROM 稳定时间（毫秒）
    pub eeprom_settle_ms: u64,
}

impl LinkSettings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            response_attempts: self.response_attempts,
            response_interval: Duration::from_millis(self.response_interval_ms),
            eeprom_settle: Duration::from_millis(self.eeprom_settle_ms),
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        let defaults = ClientConfig::default();
        Self {
            response_attempts: defaults.response_attempts,
            response_interval_ms: defaults.response_interval.as_millis() as u64,
            eeprom_settle_ms: defaults.eeprom_settle.as_millis() as u64,
        }
    }
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 默认串口
    pub port: Option<String>,
    /// 波特率（缺省 115200）
    pub baud_rate: Option<u32>,
    pub link: LinkSettings,
    pub decision: DecisionConfig,
}

impl CliConfig {
    /// 加载配置
    ///
    /// 显式给出的路径必须存在；默认路径不存在时使用默认配置。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_file()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("配置文件无效: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.decision.validate()?;
        Ok(config)
    }

    /// 保存配置
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, content).context("写入配置文件失败")?;
        Ok(())
    }

    /// 合并命令行覆盖项
    pub fn with_overrides(mut self, port: Option<String>, baud_rate: Option<u32>) -> Self {
        if port.is_some() {
            self.port = port;
        }
        if baud_rate.is_some() {
            self.baud_rate = baud_rate;
        }
        self
    }

    pub fn require_port(&self) -> Result<&str> {
        self.port.as_deref().ok_or_else(|| {
            anyhow!("未指定串口：使用 --port 或 `sortbot-cli config set --port <PORT>`")
        })
    }
}
