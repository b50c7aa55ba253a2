//! Builder 模式实现
//!
//! 提供链式构造 [`RegisterClient`] 的便捷方式。

use crate::client::RegisterClient;
use crate::config::ClientConfig;
#[cfg(feature = "native")]
use crate::error::DriverError;
use crate::hooks::EventCallback;
use sortbot_serial::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, SerialAdapter};
use std::sync::Arc;
use std::time::Duration;

/// 分拣机器人连接 Builder
///
/// # Example
///
/// ```no_run
/// use sortbot_driver::{ClientConfig, SorterBuilder};
///
/// let client = SorterBuilder::new("/dev/ttyUSB0")
///     .baud_rate(115_200)
///     .client_config(ClientConfig::default())
///     .build()
///     .unwrap();
/// ```
pub struct SorterBuilder {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
    client_config: ClientConfig,
    callbacks: Vec<Arc<dyn EventCallback>>,
}

impl SorterBuilder {
    /// 创建新的 Builder
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            client_config: ClientConfig::default(),
            callbacks: Vec::new(),
        }
    }

    /// 设置波特率（默认 115200）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// 设置串口读超时
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// 设置客户端配置
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// 注册事件回调
    pub fn callback(mut self, callback: Arc<dyn EventCallback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// 使用给定适配器构建（测试或自定义传输）
    pub fn build_with_adapter<A: SerialAdapter>(self, adapter: A) -> RegisterClient<A> {
        let mut client = RegisterClient::new(adapter, self.client_config);
        for callback in self.callbacks {
            client.hooks_mut().add_callback(callback);
        }
        client
    }

    /// 打开真实串口并构建
    #[cfg(feature = "native")]
    pub fn build(self) -> Result<RegisterClient<sortbot_serial::SerialPortAdapter>, DriverError> {
        let adapter = sortbot_serial::SerialPortAdapter::open_with_timeout(
            &self.port,
            self.baud_rate,
            self.read_timeout,
        )?;
        tracing::info!("Connected to sorting robot on {}", self.port);
        Ok(self.build_with_adapter(adapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::ChannelEventHook;
    use sortbot_serial::MockSerialAdapter;

    #[test]
    fn test_builder_defaults() {
        let builder = SorterBuilder::new("/dev/ttyUSB0");
        assert_eq!(builder.port(), "/dev/ttyUSB0");
        assert_eq!(builder.baud_rate, 115_200);
        assert_eq!(builder.client_config, ClientConfig::default());
    }

    #[test]
    fn test_build_with_adapter_registers_callbacks() {
        let (hook, rx) = ChannelEventHook::new(8);
        let (adapter, device) = MockSerialAdapter::new();
        let mut client = SorterBuilder::new("mock")
            .callback(Arc::new(hook))
            .build_with_adapter(adapter);
        assert_eq!(client.adapter_name(), "mock");

        device.inject_alarm(2, 5);
        client.poll().unwrap();
        assert!(rx.try_recv().is_ok());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_build_missing_port_fails() {
        let result = SorterBuilder::new("/dev/this-port-does-not-exist").build();
        assert!(matches!(result, Err(DriverError::Serial(_))));
    }
}
