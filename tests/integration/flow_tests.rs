//! End-to-end flows over the shipped adapters (loopback radio, BLE UART
//! state, line console, platform), driven through the event bus.

use lpnode::adapters::at_console::LineConsole;
use lpnode::adapters::ble_uart::{BleUart, UartState};
use lpnode::adapters::hardware::NodeHardware;
use lpnode::adapters::log_sink::{LinkEchoSink, LogEventSink};
use lpnode::adapters::platform::Platform;
use lpnode::adapters::radio::LoopbackRadio;
use lpnode::app::bridge::CommandBridge;
use lpnode::app::ports::{BatteryPort, LoRaWanPort};
use lpnode::app::service::NodeController;
use lpnode::config::NodeConfig;
use lpnode::events::EventBus;

struct FixedBattery(f32);

impl BatteryPort for FixedBattery {
    fn sample_millivolts(&mut self) -> f32 {
        self.0
    }
}

type Hw<'a> = NodeHardware<LoopbackRadio<'a>, BleUart<'a>, LineConsole, FixedBattery>;

fn hardware<'a>(bus: &'a EventBus, uart: &'a UartState) -> Hw<'a> {
    NodeHardware::new(
        LoopbackRadio::new(bus),
        BleUart::with_state(uart),
        LineConsole::new(),
        FixedBattery(3700.0),
        Platform::new(),
    )
}

fn fast_config() -> NodeConfig {
    NodeConfig {
        link_byte_gap_ms: 0,
        restart_delay_ms: 0,
        ..Default::default()
    }
}

#[test]
fn join_then_wake_sends_battery_uplink() {
    let bus = EventBus::new();
    let uart = UartState::new();
    let mut hw = hardware(&bus, &uart);
    let mut sink = LogEventSink::new();
    let mut ctl = NodeController::new(fast_config());

    ctl.start(&mut hw, &mut sink);
    assert!(!hw.platform.sensor_power());
    assert_eq!(hw.link.advertising(), ("RAK-LP", 30));

    hw.join().expect("join request accepted");
    assert_eq!(ctl.dispatch(&bus, &mut hw, &mut sink), 1);
    assert_eq!(ctl.session().map(|s| s.dev_addr), Some(0x260B_0001));

    bus.status_tick();
    // The loopback MAC completes the uplink inside the status handler, so
    // tx-finished is handled in the same pass.
    assert_eq!(ctl.dispatch(&bus, &mut hw, &mut sink), 2);
    assert!(bus.is_idle());

    let uplinks = hw.radio.uplinks();
    assert_eq!(uplinks.len(), 1);
    assert_eq!(uplinks[0].payload, vec![0x01, 0x74, 0x01, 0x72]);
    assert_eq!(uplinks[0].fport, 2);
    assert!(!uplinks[0].confirmed);
}

#[test]
fn uplinks_before_join_are_skipped() {
    let bus = EventBus::new();
    let uart = UartState::new();
    let mut hw = hardware(&bus, &uart);
    let mut sink = LogEventSink::new();
    let mut ctl = NodeController::new(fast_config());

    bus.status_tick();
    assert_eq!(ctl.dispatch(&bus, &mut hw, &mut sink), 1);
    assert!(hw.radio.uplinks().is_empty());
    assert_eq!(ctl.stats().not_joined, 1);
}

#[test]
fn p2p_mode_completes_without_join() {
    let bus = EventBus::new();
    let uart = UartState::new();
    let mut hw = hardware(&bus, &uart);
    let mut sink = LogEventSink::new();
    let mut ctl = NodeController::new(NodeConfig {
        lorawan_enabled: false,
        ..fast_config()
    });

    bus.status_tick();
    assert_eq!(ctl.dispatch(&bus, &mut hw, &mut sink), 2);
    assert_eq!(hw.radio.p2p_frames().len(), 1);
    assert!(hw.radio.uplinks().is_empty());
}

#[test]
fn lost_acks_restart_the_node() {
    let bus = EventBus::new();
    let uart = UartState::new();
    let mut hw = hardware(&bus, &uart);
    let mut sink = LogEventSink::new();
    let mut ctl = NodeController::new(NodeConfig {
        confirmed: true,
        ..fast_config()
    });

    hw.join().expect("join request accepted");
    ctl.dispatch(&bus, &mut hw, &mut sink);
    hw.radio.script_acks(&[false; 10]);

    for cycle in 1..=10 {
        bus.status_tick();
        ctl.dispatch(&bus, &mut hw, &mut sink);
        if cycle < 10 {
            assert_eq!(ctl.send_failures(), cycle);
        }
    }
    assert_eq!(hw.platform.restarts(), 1);
    assert_eq!(ctl.send_failures(), 0);
}

#[test]
fn ble_bytes_reach_the_console_as_a_line() {
    let bus = EventBus::new();
    let uart = UartState::new();
    let mut hw = hardware(&bus, &uart);
    let mut sink = LogEventSink::new();
    let config = fast_config();
    let mut ctl = NodeController::with_link_handler(config.clone(), CommandBridge::new(&config));

    uart.set_connected(true);
    assert_eq!(uart.on_rx(b"AT+BAT=?\r\n", &bus), 10);

    assert_eq!(ctl.dispatch(&bus, &mut hw, &mut sink), 1);
    assert_eq!(uart.available(), 0);
    assert_eq!(hw.console.take_line().as_deref(), Some("AT+BAT=?"));
    // The bridge's own terminator closes an empty line, which is ignored.
    assert_eq!(hw.console.pending(), 0);
}

#[test]
fn events_are_echoed_to_connected_central() {
    let bus = EventBus::new();
    let uart = UartState::new();
    let mut hw = hardware(&bus, &uart);
    let mut sink = LinkEchoSink::new(LogEventSink::new(), BleUart::with_state(&uart));
    let mut ctl = NodeController::new(fast_config());

    hw.join().expect("join request accepted");
    ctl.dispatch(&bus, &mut hw, &mut sink);
    assert!(uart.take_sent().is_empty(), "nothing echoed while disconnected");

    uart.set_connected(true);
    bus.status_tick();
    ctl.dispatch(&bus, &mut hw, &mut sink);

    let echoed = String::from_utf8(uart.take_sent()).expect("ascii");
    let lines: Vec<&str> = echoed.lines().collect();
    assert_eq!(
        lines,
        [
            "WAKE  | battery=3.70V",
            "TX    | enqueued | 4 bytes",
            "TXFIN | unconfirmed",
        ]
    );
}
