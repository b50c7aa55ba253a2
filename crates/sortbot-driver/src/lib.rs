//! 驱动层模块
//!
//! 本模块提供分拣机器人的寄存器访问功能，包括：
//! - 读/写寄存器命令发送
//! - 串口字节轮询与帧解码（寄存器镜像维护）
//! - 有界等待读应答（默认 10 × 5ms）
//! - 类型化的读取（设备信息、拨杆偏移、执行/垃圾桶状态）与设置
//! - 钩子系统：事件监视、报警转发
//!
//! 整个驱动运行在单一控制线程上，寄存器镜像和解码器状态由
//! [`RegisterClient`] 独占持有，不需要同步。

mod builder;
pub mod client;
pub mod config;
mod error;
pub mod hooks;
pub mod types;

pub use builder::SorterBuilder;
pub use client::{PollResult, RegisterClient};
pub use config::ClientConfig;
pub use error::DriverError;
pub use hooks::{ChannelEventHook, EventCallback, HookManager};
pub use types::{BinStatus, ExecutionStatus, FirmwareVersion, MacAddress, RegisterRead};
