//! 分拣决策状态机
//!
//! 纯逻辑，不做任何 I/O：输入分类样本与当前时刻，输出需要下发的
//! 分拣命令。时间由调用方传入，测试时可直接构造任意 `Instant`。
//!
//! ```text
//! Idle --(票数 > 阈值 且 置信度 > 阈值 且 类别 ∈ 1..=4)--> Sorting{category}
//! Sorting --(now - started_at > duration)--> Idle
//! ```
//!
//! `Sorting` 期间投票窗口冻结，不接收新样本。

use crate::config::DecisionConfig;
use crate::error::ClientError;
use crate::types::{ClassificationSample, SortingCategory};
use crate::vote::VoteWindow;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 分拣机构运动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Sorting {
        category: SortingCategory,
        started_at: Instant,
        duration: Duration,
    },
}

impl MotionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, MotionState::Idle)
    }

    /// 当前分拣类别（空闲时为 `None`）
    pub fn category(&self) -> Option<SortingCategory> {
        match self {
            MotionState::Idle => None,
            MotionState::Sorting { category, .. } => Some(*category),
        }
    }
}

/// 状态机产出的分拣命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortingCommand {
    /// 开始向指定垃圾桶分拣
    Start(SortingCategory),
    /// 分拣结束，回到待机（写入 0）
    Stop,
}

impl SortingCommand {
    /// 写入分拣寄存器的值
    pub fn sorting_id(self) -> u8 {
        match self {
            SortingCommand::Start(category) => category.sorting_id(),
            SortingCommand::Stop => 0,
        }
    }
}

/// 分拣决策引擎
#[derive(Debug, Clone)]
pub struct SortingEngine {
    config: DecisionConfig,
    window: VoteWindow,
    state: MotionState,
    /// 自上次入窗以来跳过的样本数
    skipped: u32,
}

impl SortingEngine {
    pub fn new(config: DecisionConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            window: VoteWindow::new(config.window_len),
            config,
            state: MotionState::Idle,
            skipped: 0,
        })
    }

    /// 处理一个分类样本
    ///
    /// 先（仅在空闲时）入窗并判定是否开始分拣，再检查当前分拣是否到期。
    /// 每次调用最多产出一条命令。
    pub fn on_sample(
        &mut self,
        sample: ClassificationSample,
        now: Instant,
    ) -> Option<SortingCommand> {
        if self.state.is_idle() {
            if self.admit(sample.class_id) {
                let command = self.decide(sample, now);
                if command.is_some() {
                    return command;
                }
            }
        } else {
            // 分拣期间照常计数（饱和），结束后的第一个样本直接入窗
            self.skipped = (self.skipped + 1).min(self.config.sample_stride - 1);
        }
        self.tick(now)
    }

    /// 检查分拣是否到期（严格大于时长才结束）
    pub fn tick(&mut self, now: Instant) -> Option<SortingCommand> {
        let MotionState::Sorting {
            category,
            started_at,
            duration,
        } = self.state
        else {
            return None;
        };

        let elapsed = now.saturating_duration_since(started_at);
        if elapsed > duration {
            info!(
                "Sorting {} finished after {} ms, back to idle",
                category,
                elapsed.as_millis()
            );
            self.state = MotionState::Idle;
            Some(SortingCommand::Stop)
        } else {
            None
        }
    }

    /// 立即结束当前分拣（如退出时）
    pub fn abort(&mut self) -> Option<SortingCommand> {
        match self.state {
            MotionState::Idle => None,
            MotionState::Sorting { category, .. } => {
                info!("Sorting {} aborted", category);
                self.state = MotionState::Idle;
                Some(SortingCommand::Stop)
            },
        }
    }

    /// 按步长抽样入窗，返回本样本是否进入窗口
    fn admit(&mut self, class_id: u8) -> bool {
        self.skipped += 1;
        if self.skipped < self.config.sample_stride {
            return false;
        }
        self.skipped = 0;
        self.window.push(class_id);
        true
    }

    fn decide(&mut self, sample: ClassificationSample, now: Instant) -> Option<SortingCommand> {
        if sample.probability <= self.config.probability_threshold {
            return None;
        }
        let votes = self.window.count(sample.class_id);
        if votes <= self.config.vote_threshold {
            return None;
        }
        let category = sample.category()?;

        let duration = self.config.durations.for_category(category);
        debug!(
            "Class {} has {} votes at {}% confidence",
            sample.class_id, votes, sample.probability
        );
        info!("Start sorting {} for {} ms", category, duration.as_millis());
        self.state = MotionState::Sorting {
            category,
            started_at: now,
            duration,
        };
        Some(SortingCommand::Start(category))
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_sorting(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn window(&self) -> &VoteWindow {
        &self.window
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }
}
