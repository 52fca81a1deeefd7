//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements             | Connects to                  |
//! |--------------|------------------------|------------------------------|
//! | `at_console` | CommandSink            | Command interpreter input    |
//! | `ble_uart`   | LinkPort               | Bluedroid Nordic UART service|
//! | `hardware`   | all of `NodePorts`     | The adapters below, combined |
//! | `log_sink`   | EventSink              | Serial log, BLE UART echo    |
//! | `nvs`        | StoragePort            | NVS / in-memory store        |
//! | `platform`   | PlatformPort, DelayNs  | esp_restart, FreeRTOS, GPIO  |
//! | `radio`      | LoRaWanPort, P2pPort   | Loopback (scripted) radio    |
//! | `settings`   | ConfigPort             | Any StoragePort (postcard)   |
//! | `time`       | (clock only)           | ESP32 system timer           |

pub mod at_console;
pub mod ble_uart;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod platform;
pub mod radio;
pub mod settings;
pub mod time;
