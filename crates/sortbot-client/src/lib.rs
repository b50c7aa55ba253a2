//! 分拣决策层
//!
//! 把分类器逐帧输出的 `(class_id, probability)` 去抖为分拣动作：
//! - [`VoteWindow`]：最近 N 帧的多数票窗口
//! - [`SortingEngine`]：Idle / Sorting 状态机，纯逻辑、时间由调用方注入
//! - [`SortingController`]：把状态机命令写到机器人分拣寄存器
//!
//! # Example
//!
//! ```
//! use sortbot_client::{ClassificationSample, DecisionConfig, SortingCommand, SortingEngine};
//! use std::time::Instant;
//!
//! let mut engine = SortingEngine::new(DecisionConfig::default()).unwrap();
//! let now = Instant::now();
//! let mut commands = Vec::new();
//! for _ in 0..19 {
//!     commands.extend(engine.on_sample(ClassificationSample::new(1, 90), now));
//! }
//! assert_eq!(commands.len(), 1);
//! assert!(matches!(commands[0], SortingCommand::Start(_)));
//! ```

pub mod config;
pub mod controller;
pub mod engine;
mod error;
pub mod types;
pub mod vote;

pub use config::{CategoryDurations, DecisionConfig};
pub use controller::SortingController;
pub use engine::{MotionState, SortingCommand, SortingEngine};
pub use error::ClientError;
pub use types::{ClassificationSample, SortingCategory};
pub use vote::VoteWindow;
