//! 分拣决策配置

use crate::error::ClientError;
use crate::types::SortingCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 每个类别的分拣动作时长（毫秒）
///
/// 这些是分拣机构对应各垃圾桶的固定物理时长，不随运行时测量变化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDurations {
    pub recyclable_ms: u64,
    pub hazardous_ms: u64,
    pub kitchen_ms: u64,
    pub other_ms: u64,
}

impl CategoryDurations {
    pub fn for_category(&self, category: SortingCategory) -> Duration {
        let ms = match category {
            SortingCategory::Recyclable => self.recyclable_ms,
            SortingCategory::Hazardous => self.hazardous_ms,
            SortingCategory::Kitchen => self.kitchen_ms,
            SortingCategory::Other => self.other_ms,
        };
        Duration::from_millis(ms)
    }
}

impl Default for CategoryDurations {
    fn default() -> Self {
        Self {
            recyclable_ms: 8_000,
            hazardous_ms: 10_000,
            kitchen_ms: 12_000,
            other_ms: 14_000,
        }
    }
}

/// 分拣决策配置
///
/// 触发条件：`probability > probability_threshold` 且
/// 投票窗口中同类票数 `> vote_threshold`（默认 20 票中至少 19 票一致）。
///
/// # Example
///
/// ```
/// use sortbot_client::DecisionConfig;
///
/// let config = DecisionConfig::from_toml_str(r#"
///     probability_threshold = 90
///
///     [durations]
///     recyclable_ms = 5000
/// "#).unwrap();
///
/// assert_eq!(config.window_len, 20);
/// assert_eq!(config.probability_threshold, 90);
/// assert_eq!(config.durations.recyclable_ms, 5000);
/// assert_eq!(config.durations.other_ms, 14000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// 投票窗口长度
    pub window_len: usize,
    /// 票数阈值（严格大于）
    pub vote_threshold: usize,
    /// 置信度阈值（严格大于，百分比）
    pub probability_threshold: u8,
    /// 抽样步长：每 N 个样本取 1 个进入投票窗口
    pub sample_stride: u32,
    /// 各类别动作时长
    pub durations: CategoryDurations,
}

impl DecisionConfig {
    /// 校验参数
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.window_len == 0 {
            return Err(ClientError::InvalidConfig("window_len must be > 0".into()));
        }
        if self.vote_threshold >= self.window_len {
            return Err(ClientError::InvalidConfig(format!(
                "vote_threshold ({}) must be < window_len ({})",
                self.vote_threshold, self.window_len
            )));
        }
        if self.sample_stride == 0 {
            return Err(ClientError::InvalidConfig("sample_stride must be >= 1".into()));
        }
        Ok(())
    }

    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ClientError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载并校验
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            window_len: 20,
            vote_threshold: 18,
            probability_threshold: 85,
            sample_stride: 1,
            durations: CategoryDurations::default(),
        }
    }
}
