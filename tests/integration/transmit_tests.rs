//! Wake cycle: battery sampling, payload build, route selection.

use crate::mock_node::{MockNode, PortCall, RecordingSink};

use lpnode::app::events::{AppEvent, TxOutcome};
use lpnode::app::ports::EnqueueResult;
use lpnode::app::service::NodeController;
use lpnode::config::NodeConfig;
use lpnode::payload::{CHANNEL_BATTERY, SensorType};

fn run_cycle(config: NodeConfig, hw: &mut MockNode) -> (NodeController, TxOutcome, RecordingSink) {
    let mut ctl = NodeController::new(config);
    let mut sink = RecordingSink::new();
    let outcome = ctl.on_status(hw, &mut sink);
    (ctl, outcome, sink)
}

#[test]
fn joined_cycle_enqueues_one_voltage_record() {
    let mut hw = MockNode::new();
    hw.default_mv = 3720.0;
    let (ctl, outcome, _) = run_cycle(NodeConfig::default(), &mut hw);

    assert_eq!(outcome, TxOutcome::Enqueued);
    let sent = hw.enqueued();
    assert_eq!(sent.len(), 1);
    // 3.72 V at 0.01 V resolution = 372 = 0x0174.
    assert_eq!(sent[0].as_slice(), &[0x01, 0x74, 0x01, 0x74]);

    let records: Vec<_> = ctl.payload().records().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel, CHANNEL_BATTERY);
    assert_eq!(records[0].ty, SensorType::Voltage);
}

#[test]
fn uplink_uses_configured_port_and_confirmation() {
    let mut hw = MockNode::new();
    let config = NodeConfig {
        fport: 10,
        confirmed: true,
        ..Default::default()
    };
    run_cycle(config, &mut hw);

    assert!(matches!(
        hw.calls.last(),
        Some(PortCall::Enqueue {
            fport: 10,
            confirmed: true,
            ..
        })
    ));
}

#[test]
fn battery_is_mean_of_ten_samples() {
    let mut hw = MockNode::new();
    hw.battery_mv = (0..10).map(|i| 3600.0 + i as f32 * 20.0).collect();
    hw.default_mv = 0.0;
    let (_, _, sink) = run_cycle(NodeConfig::default(), &mut hw);

    assert!(hw.battery_mv.is_empty(), "exactly ten samples consumed");
    let volts = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Wakeup { battery_volts } => Some(*battery_volts),
            _ => None,
        })
        .expect("wakeup emitted");
    assert!((volts - 3.69).abs() < 1e-4);
}

#[test]
fn p2p_mode_sends_once_and_never_enqueues() {
    let mut hw = MockNode::unjoined();
    let config = NodeConfig {
        lorawan_enabled: false,
        ..Default::default()
    };
    let (ctl, outcome, _) = run_cycle(config, &mut hw);

    assert_eq!(outcome, TxOutcome::P2pSent);
    assert_eq!(hw.p2p_sent().len(), 1);
    assert!(hw.enqueued().is_empty());
    assert_eq!(ctl.stats().p2p_sent, 1);
}

#[test]
fn not_joined_sends_nothing() {
    let mut hw = MockNode::unjoined();
    let (ctl, outcome, sink) = run_cycle(NodeConfig::default(), &mut hw);

    assert_eq!(outcome, TxOutcome::NotJoined);
    assert!(hw.enqueued().is_empty());
    assert!(hw.p2p_sent().is_empty());
    assert_eq!(ctl.stats().not_joined, 1);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::Uplink {
            outcome: TxOutcome::NotJoined,
            len: 4
        })
    ));
}

#[test]
fn busy_and_rejected_are_terminal() {
    for (result, expected) in [
        (EnqueueResult::Busy, TxOutcome::Busy),
        (EnqueueResult::Rejected, TxOutcome::Rejected),
    ] {
        let mut hw = MockNode::new();
        hw.enqueue_result = result;
        let (ctl, outcome, _) = run_cycle(NodeConfig::default(), &mut hw);

        assert_eq!(outcome, expected);
        // One attempt, no retry, no failure accounting.
        assert_eq!(hw.enqueued().len(), 1);
        assert_eq!(ctl.send_failures(), 0);
    }
}

#[test]
fn payload_is_rebuilt_each_cycle() {
    let mut ctl = NodeController::new(NodeConfig::default());
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    ctl.on_status(&mut hw, &mut sink);
    ctl.on_status(&mut hw, &mut sink);

    assert_eq!(ctl.payload().len(), 4);
    let sent = hw.enqueued();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}
