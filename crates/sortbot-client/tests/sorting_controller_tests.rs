//! 分拣控制器集成测试
//!
//! 分类样本 -> 状态机 -> 分拣寄存器写帧 -> 模拟设备。

use sortbot_client::*;
use sortbot_driver::{ChannelEventHook, ClientConfig, SorterBuilder};
use sortbot_protocol::{DecodedEvent, Instruction, REG_BIN_STATUS, REG_SORTING};
use sortbot_serial::MockSerialAdapter;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_full_sorting_cycle_on_device() {
    let (adapter, device) = MockSerialAdapter::new();
    let client = SorterBuilder::new("mock")
        .client_config(ClientConfig::default())
        .build_with_adapter(adapter);
    let mut controller = SortingController::new(client, DecisionConfig::default()).unwrap();

    let t0 = Instant::now();
    for i in 1..=18 {
        let command = controller
            .on_classification_at(ClassificationSample::new(4, 92), t0)
            .unwrap();
        assert_eq!(command, None, "sample {i}");
    }
    assert!(device.writes_to(REG_SORTING).is_empty());

    let command = controller
        .on_classification_at(ClassificationSample::new(4, 92), t0)
        .unwrap();
    assert_eq!(command, Some(SortingCommand::Start(SortingCategory::Other)));
    assert_eq!(device.register(REG_SORTING), 4);

    // 14s 内继续送样本，不会再写
    for ms in [1_000u64, 7_000, 13_999, 14_000] {
        controller
            .on_classification_at(ClassificationSample::new(1, 99), t0 + Duration::from_millis(ms))
            .unwrap();
    }
    assert_eq!(device.writes_to(REG_SORTING), vec![4]);

    let command = controller
        .on_classification_at(
            ClassificationSample::new(1, 99),
            t0 + Duration::from_millis(14_001),
        )
        .unwrap();
    assert_eq!(command, Some(SortingCommand::Stop));
    assert_eq!(device.register(REG_SORTING), 0);

    let frames = device.host_frames();
    assert!(frames
        .iter()
        .all(|f| f.instruction == u8::from(Instruction::WriteRegister) && f.addr == REG_SORTING));
    assert_eq!(frames.len(), 2);
}

#[test]
fn test_feedback_drained_between_samples() {
    let (hook, rx) = ChannelEventHook::new(8);
    let (adapter, device) = MockSerialAdapter::new();
    let client = SorterBuilder::new("mock")
        .callback(Arc::new(hook))
        .build_with_adapter(adapter);
    let mut controller = SortingController::new(client, DecisionConfig::default()).unwrap();

    device.inject_feedback(REG_BIN_STATUS, &[0b0000_0110]);
    controller
        .on_classification(ClassificationSample::new(0, 50))
        .unwrap();

    assert_eq!(device.pending_rx(), 0);
    assert_eq!(controller.client().registers().get(REG_BIN_STATUS), 0b0000_0110);
    assert!(matches!(rx.try_recv(), Ok(DecodedEvent::Feedback(_))));
}
