//! LP Node Firmware: main entry point
//!
//! Hexagonal architecture with event-driven execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  LoopbackRadio   BleUart    LineConsole   AdcBatterySampler    │
//! │  (LoRaWAN+P2P)   (Link)     (Commands)    (Battery)            │
//! │  Platform        LogEventSink+LinkEchoSink  MemorySettings     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            NodeController (pure logic)                 │    │
//! │  │  Payload · Routing · Session · Recovery · Bridge       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EVENTS (atomic bitset) ◀── wake timer · radio · BLE callbacks │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use lpnode::adapters::at_console::LineConsole;
use lpnode::adapters::ble_uart::BleUart;
use lpnode::adapters::hardware::NodeHardware;
use lpnode::adapters::log_sink::{LinkEchoSink, LogEventSink};
use lpnode::adapters::nvs::NvsAdapter;
use lpnode::adapters::platform::Platform;
use lpnode::adapters::radio::LoopbackRadio;
use lpnode::adapters::settings::MemorySettings;
use lpnode::app::bridge::CommandBridge;
use lpnode::app::ports::{ConfigPort, LoRaWanPort};
use lpnode::app::service::NodeController;
use lpnode::config::{FIRMWARE_VERSION, NodeConfig};
use lpnode::drivers::{hw_init, hw_timer};
use lpnode::error;
use lpnode::events::EVENTS;
use lpnode::pins;
use lpnode::sensors::AdcBatterySampler;

/// Main-loop sleep while no event is pending.
const IDLE_POLL_MS: u32 = 10;

/// Request the first join and start the wake timer.
fn arm(radio: &mut impl LoRaWanPort, config: &NodeConfig) -> error::Result<()> {
    if config.lorawan_enabled {
        radio.join()?;
    }
    hw_timer::start_wake_timer(config.send_interval_secs)?;
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let (major, minor, patch) = FIRMWARE_VERSION;
    info!("╔══════════════════════════════════════╗");
    info!("║  LP Node v{}.{}.{}                      ║", major, minor, patch);
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let settings = match NvsAdapter::new() {
        Ok(nvs) => Some(MemorySettings::new(nvs)),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = match settings.as_ref().map(|s| s.load()) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("Config load failed ({}), using defaults", e);
            NodeConfig::default()
        }
        None => NodeConfig::default(),
    };

    // ── 4. Adapters ───────────────────────────────────────────
    // Controller and bridge must not touch a BLE stack that never came up.
    let config = match config.ble_enabled.then(BleUart::init_stack) {
        Some(Err(e)) => {
            warn!("{}; continuing without BLE", e);
            config.without_ble()
        }
        _ => config,
    };

    warn!("Radio: loopback adapter, no transceiver attached");
    let mut hw = NodeHardware::new(
        LoopbackRadio::new(&EVENTS),
        BleUart::global(),
        LineConsole::new(),
        AdcBatterySampler::new(pins::VBAT_ADC_GPIO),
        Platform::new(),
    );
    let mut sink = LinkEchoSink::new(LogEventSink::new(), BleUart::global());

    // ── 5. Controller ─────────────────────────────────────────
    let bridge = CommandBridge::new(&config);
    let mut node = NodeController::with_link_handler(config.clone(), bridge);
    node.start(&mut hw, &mut sink);

    arm(&mut hw, &config)?;

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        if node.dispatch(&EVENTS, &mut hw, &mut sink) == 0 {
            esp_idf_hal::delay::FreeRtos::delay_ms(IDLE_POLL_MS);
        }

        // Drain assembled command lines; interpretation is external.
        while let Some(line) = hw.console.take_line() {
            info!("[AT] queued '{}'", line);
        }
    }
}
