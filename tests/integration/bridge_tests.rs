//! BLE UART → console relay through the controller.

use crate::mock_node::{MockNode, PortCall, RecordingSink};

use lpnode::app::bridge::{CommandBridge, LINE_TERMINATOR};
use lpnode::app::events::AppEvent;
use lpnode::app::service::NodeController;
use lpnode::config::NodeConfig;
use lpnode::events::EventBus;

fn bridged(config: NodeConfig) -> NodeController<CommandBridge> {
    let bridge = CommandBridge::new(&config);
    NodeController::with_link_handler(config, bridge)
}

#[test]
fn bytes_are_paced_then_terminated() {
    let mut ctl = bridged(NodeConfig::default());
    let mut hw = MockNode::new().with_link_bytes(b"AT+V");
    let mut sink = RecordingSink::new();

    ctl.on_link_data(&mut hw, &mut sink);

    let mut expected = Vec::new();
    for b in b"AT+V" {
        expected.push(PortCall::Submit(*b));
        expected.push(PortCall::DelayMs(5));
    }
    expected.push(PortCall::Submit(LINE_TERMINATOR));
    assert_eq!(hw.calls, expected);
    assert_eq!(hw.link_rx.len(), 0);
    assert_eq!(sink.last(), Some(&AppEvent::LinkCommand { bytes: 4 }));
}

#[test]
fn empty_buffer_still_sends_terminator() {
    let mut ctl = bridged(NodeConfig::default());
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    ctl.on_link_data(&mut hw, &mut sink);

    assert_eq!(hw.submitted(), vec![LINE_TERMINATOR]);
    assert_eq!(sink.last(), Some(&AppEvent::LinkCommand { bytes: 0 }));
}

#[test]
fn byte_gap_follows_config() {
    let mut ctl = bridged(NodeConfig {
        link_byte_gap_ms: 12,
        ..Default::default()
    });
    let mut hw = MockNode::new().with_link_bytes(b"xy");
    let mut sink = RecordingSink::new();

    ctl.on_link_data(&mut hw, &mut sink);
    assert_eq!(hw.count(&PortCall::DelayMs(12)), 2);
}

#[test]
fn default_controller_leaves_bytes_buffered() {
    let bus = EventBus::new();
    bus.link_data();

    let mut ctl = NodeController::new(NodeConfig::default());
    let mut hw = MockNode::new().with_link_bytes(b"AT");
    let mut sink = RecordingSink::new();

    assert_eq!(ctl.dispatch(&bus, &mut hw, &mut sink), 1);
    assert!(hw.submitted().is_empty());
    assert_eq!(hw.link_rx.len(), 2);
    assert!(sink.events.is_empty());
}

#[test]
fn disabling_ble_switches_the_bridge_off() {
    let mut ctl = bridged(NodeConfig::default());
    assert!(ctl.link_handler().is_enabled());

    ctl.apply_config(NodeConfig {
        ble_enabled: false,
        ..Default::default()
    })
    .expect("valid config");
    assert!(!ctl.link_handler().is_enabled());

    let mut hw = MockNode::new().with_link_bytes(b"AT");
    let mut sink = RecordingSink::new();
    ctl.on_link_data(&mut hw, &mut sink);
    assert!(hw.calls.is_empty());
    assert_eq!(ctl.stats().link_batches, 0);
}

#[test]
fn failed_ble_bring_up_leaves_link_untouched() {
    let mut ctl = bridged(NodeConfig::default().without_ble());
    assert!(!ctl.link_handler().is_enabled());

    let mut hw = MockNode::new().with_link_bytes(b"AT");
    let mut sink = RecordingSink::new();
    ctl.start(&mut hw, &mut sink);
    ctl.on_link_data(&mut hw, &mut sink);

    assert_eq!(hw.calls, vec![PortCall::SensorPower(false)]);
}
