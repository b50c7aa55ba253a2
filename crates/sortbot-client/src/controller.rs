//! 分拣控制器
//!
//! 把 [`SortingEngine`] 的决策接到 [`RegisterClient`] 上：每个样本到来时
//! 先排空串口上的反馈/报警，再把状态机产出的命令写入分拣寄存器。

use crate::config::DecisionConfig;
use crate::engine::{MotionState, SortingCommand, SortingEngine};
use crate::error::ClientError;
use crate::types::ClassificationSample;
use sortbot_driver::RegisterClient;
use sortbot_serial::SerialAdapter;
use std::time::Instant;
use tracing::trace;

pub struct SortingController<A> {
    client: RegisterClient<A>,
    engine: SortingEngine,
}

impl<A: SerialAdapter> SortingController<A> {
    pub fn new(client: RegisterClient<A>, config: DecisionConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            engine: SortingEngine::new(config)?,
        })
    }

    /// 处理一个分类样本，返回已下发的命令
    pub fn on_classification(
        &mut self,
        sample: ClassificationSample,
    ) -> Result<Option<SortingCommand>, ClientError> {
        self.on_classification_at(sample, Instant::now())
    }

    pub fn on_classification_at(
        &mut self,
        sample: ClassificationSample,
        now: Instant,
    ) -> Result<Option<SortingCommand>, ClientError> {
        let polled = self.client.poll()?;
        if polled.bytes > 0 {
            trace!("Drained {} bytes before sample", polled.bytes);
        }
        let command = self.engine.on_sample(sample, now);
        self.issue(command)
    }

    /// 无新样本时推进计时（分类器停顿时仍能按时结束分拣）
    pub fn tick(&mut self) -> Result<Option<SortingCommand>, ClientError> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Result<Option<SortingCommand>, ClientError> {
        self.client.poll()?;
        let command = self.engine.tick(now);
        self.issue(command)
    }

    /// 立即结束当前分拣并写入 0
    pub fn abort(&mut self) -> Result<Option<SortingCommand>, ClientError> {
        let command = self.engine.abort();
        self.issue(command)
    }

    fn issue(
        &mut self,
        command: Option<SortingCommand>,
    ) -> Result<Option<SortingCommand>, ClientError> {
        if let Some(command) = command {
            self.client.set_sorting(command.sorting_id())?;
        }
        Ok(command)
    }

    pub fn state(&self) -> MotionState {
        self.engine.state()
    }

    pub fn engine(&self) -> &SortingEngine {
        &self.engine
    }

    pub fn client(&self) -> &RegisterClient<A> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut RegisterClient<A> {
        &mut self.client
    }

    pub fn into_client(self) -> RegisterClient<A> {
        self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortingCategory;
    use sortbot_driver::ClientConfig;
    use sortbot_protocol::REG_SORTING;
    use sortbot_serial::{MockDevice, MockSerialAdapter};
    use std::time::Duration;

    fn controller() -> (SortingController<MockSerialAdapter>, MockDevice) {
        let (adapter, device) = MockSerialAdapter::new();
        let client = RegisterClient::new(adapter, ClientConfig::default());
        let controller = SortingController::new(client, DecisionConfig::default()).unwrap();
        (controller, device)
    }

    #[test]
    fn test_start_and_stop_written_once() {
        let (mut controller, device) = controller();
        let t0 = Instant::now();
        for _ in 0..30 {
            controller
                .on_classification_at(ClassificationSample::new(2, 95), t0)
                .unwrap();
        }
        assert_eq!(device.writes_to(REG_SORTING), vec![2]);
        assert_eq!(controller.state().category(), Some(SortingCategory::Hazardous));

        assert_eq!(
            controller.tick_at(t0 + Duration::from_millis(9_999)).unwrap(),
            None
        );
        assert_eq!(
            controller.tick_at(t0 + Duration::from_millis(10_001)).unwrap(),
            Some(SortingCommand::Stop)
        );
        controller.tick_at(t0 + Duration::from_millis(20_000)).unwrap();
        assert_eq!(device.writes_to(REG_SORTING), vec![2, 0]);
    }

    #[test]
    fn test_abort_writes_zero() {
        let (mut controller, device) = controller();
        assert_eq!(controller.abort().unwrap(), None);
        assert!(device.writes_to(REG_SORTING).is_empty());

        let t0 = Instant::now();
        for _ in 0..19 {
            controller
                .on_classification_at(ClassificationSample::new(3, 99), t0)
                .unwrap();
        }
        assert_eq!(controller.abort().unwrap(), Some(SortingCommand::Stop));
        assert_eq!(device.writes_to(REG_SORTING), vec![3, 0]);
    }

    #[test]
    fn test_disconnect_surfaces_error() {
        let (mut controller, device) = controller();
        device.disconnect();
        let result = controller.on_classification(ClassificationSample::new(1, 90));
        assert!(matches!(result, Err(ClientError::Driver(_))));
    }
}
