//! BLE UART adapter.
//!
//! Implements [`LinkPort`] over the Nordic UART Service: centrals write
//! into the RX characteristic, the node notifies on the TX characteristic.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via raw
//!   `esp_idf_svc::sys` calls.
//! - **all other targets**: the same receive ring, fed by tests through
//!   [`UartState::on_rx`]; notifications land in a capture buffer.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                                   | Perms        |
//! |----------------|----------------------------------------|--------------|
//! | RX             | `6e400002-b5a3-f393-e0a9-e50e24dcca9e` | Write        |
//! | TX             | `6e400003-b5a3-f393-e0a9-e50e24dcca9e` | Notify       |

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Deque;
use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::config::BLE_NAME_MAX;
use crate::events::EventBus;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x6e400001_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_RX: u128 = 0x6e400002_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_TX: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

/// Receive ring size.
pub const RX_RING_CAPACITY: usize = 256;

/// Notification payload with the default ATT MTU (23 - 3 header bytes).
const NOTIFY_CHUNK: usize = 20;

#[cfg(not(target_os = "espidf"))]
const SIM_TX_CAPACITY: usize = 1024;

// ───────────────────────────────────────────────────────────────
// Shared state (GATT callback ↔ main loop)
// ───────────────────────────────────────────────────────────────

/// Link state shared between the BLE callback context and the main loop.
///
/// Bluedroid callbacks are C function pointers that cannot capture Rust
/// closures, so the production instance is the [`BLE_UART`] static.
pub struct UartState {
    rx: Mutex<CriticalSectionRawMutex, RefCell<Deque<u8, RX_RING_CAPACITY>>>,
    connected: AtomicBool,
    dropped: core::sync::atomic::AtomicU32,
    #[cfg(not(target_os = "espidf"))]
    tx: Mutex<CriticalSectionRawMutex, RefCell<heapless::Vec<u8, SIM_TX_CAPACITY>>>,
}

impl Default for UartState {
    fn default() -> Self {
        Self::new()
    }
}

impl UartState {
    pub const fn new() -> Self {
        Self {
            rx: Mutex::new(RefCell::new(Deque::new())),
            connected: AtomicBool::new(false),
            dropped: core::sync::atomic::AtomicU32::new(0),
            #[cfg(not(target_os = "espidf"))]
            tx: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }

    /// Buffer bytes written by the central and signal link data.
    ///
    /// Bytes that do not fit are dropped and counted. Returns how many
    /// were buffered.
    pub fn on_rx(&self, data: &[u8], bus: &EventBus) -> usize {
        let stored = self.rx.lock(|rx| {
            let mut rx = rx.borrow_mut();
            let mut n = 0;
            for &b in data {
                if rx.push_back(b).is_err() {
                    break;
                }
                n += 1;
            }
            n
        });
        let lost = data.len() - stored;
        if lost > 0 {
            self.dropped.fetch_add(lost as u32, Ordering::Relaxed);
        }
        if stored > 0 {
            bus.link_data();
        }
        stored
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
        if !connected {
            // A new central starts with an empty buffer.
            self.rx.lock(|rx| rx.borrow_mut().clear());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.rx.lock(|rx| rx.borrow().len())
    }

    pub fn pop(&self) -> Option<u8> {
        self.rx.lock(|rx| rx.borrow_mut().pop_front())
    }

    /// Bytes lost to a full ring since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drain everything notified so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn take_sent(&self) -> std::vec::Vec<u8> {
        self.tx.lock(|tx| {
            let mut tx = tx.borrow_mut();
            let out = tx.to_vec();
            tx.clear();
            out
        })
    }
}

/// Production link state, written by the GATT server callbacks.
pub static BLE_UART: UartState = UartState::new();

// ───────────────────────────────────────────────────────────────
// ESP-IDF GATT server
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod gatt {
    use core::sync::atomic::{AtomicU32, Ordering};

    use esp_idf_svc::sys::*;

    use super::{BLE_UART, CHAR_RX, CHAR_TX, SERVICE_UUID};
    use crate::events::EVENTS;

    pub(super) static GATTS_IF: AtomicU32 = AtomicU32::new(0);
    pub(super) static CONN_ID: AtomicU32 = AtomicU32::new(0);
    pub(super) static TX_HANDLE: AtomicU32 = AtomicU32::new(0);
    static RX_HANDLE: AtomicU32 = AtomicU32::new(0);
    static SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
    static CHAR_STEP: AtomicU32 = AtomicU32::new(0);

    fn uuid128_to_esp(uuid: u128) -> esp_bt_uuid_t {
        // SAFETY: esp_bt_uuid_t is a plain C struct; all-zero is valid.
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = 16;
        t.uuid.uuid128 = uuid.to_le_bytes();
        t
    }

    unsafe fn add_char(svc_handle: u16, uuid: u128, perm: u32, prop: u32) {
        let mut char_uuid = uuid128_to_esp(uuid);
        unsafe {
            esp_ble_gatts_add_char(
                svc_handle,
                &mut char_uuid,
                perm as esp_gatt_perm_t,
                prop as esp_gatt_char_prop_t,
                core::ptr::null_mut(),
                core::ptr::null_mut(),
            );
        }
    }

    pub(super) unsafe fn start_advertising() {
        // SAFETY: plain C struct; remaining fields zero.
        let mut adv_params = unsafe {
            esp_ble_adv_params_t {
                adv_int_min: 0x20,
                adv_int_max: 0x40,
                adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
                own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
                channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
                adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
                ..core::mem::zeroed()
            }
        };
        unsafe { esp_ble_gap_start_advertising(&mut adv_params) };
    }

    pub(super) unsafe extern "C" fn gap_event_handler(
        event: esp_gap_ble_cb_event_t,
        _param: *mut esp_ble_gap_cb_param_t,
    ) {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => unsafe {
                start_advertising();
            },
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                log::info!("BLE GAP: advertising started");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
                log::info!("BLE GAP: advertising stopped");
            }
            _ => {}
        }
    }

    pub(super) unsafe extern "C" fn gatts_event_handler(
        event: esp_gatts_cb_event_t,
        gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        GATTS_IF.store(gatts_if as u32, Ordering::Relaxed);

        match event {
            esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t {
                        uuid: uuid128_to_esp(SERVICE_UUID),
                        inst_id: 0,
                    },
                    is_primary: true,
                };
                unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 6) };
            }
            esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                let svc_handle = unsafe { (*param).create.service_handle };
                SVC_HANDLE.store(svc_handle as u32, Ordering::Relaxed);
                CHAR_STEP.store(1, Ordering::Relaxed);
                unsafe {
                    esp_ble_gatts_start_service(svc_handle);
                    add_char(
                        svc_handle,
                        CHAR_RX,
                        ESP_GATT_PERM_WRITE,
                        ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
                    );
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                let handle = unsafe { (*param).add_char.attr_handle };
                let svc_handle = SVC_HANDLE.load(Ordering::Relaxed) as u16;
                match CHAR_STEP.load(Ordering::Relaxed) {
                    1 => {
                        RX_HANDLE.store(handle as u32, Ordering::Relaxed);
                        CHAR_STEP.store(2, Ordering::Relaxed);
                        unsafe {
                            add_char(
                                svc_handle,
                                CHAR_TX,
                                ESP_GATT_PERM_READ,
                                ESP_GATT_CHAR_PROP_BIT_NOTIFY,
                            );
                        }
                    }
                    2 => {
                        TX_HANDLE.store(handle as u32, Ordering::Relaxed);
                        CHAR_STEP.store(3, Ordering::Relaxed);
                        log::info!("BLE GATTS: UART service registered");
                    }
                    _ => {}
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                let conn_id = unsafe { (*param).connect.conn_id };
                CONN_ID.store(conn_id as u32, Ordering::Relaxed);
                BLE_UART.set_connected(true);
                log::info!("BLE GATTS: central connected (conn_id={})", conn_id);
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                BLE_UART.set_connected(false);
                log::info!("BLE GATTS: central disconnected");
                unsafe { start_advertising() };
            }
            esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                let p = unsafe { &(*param).write };
                if p.handle as u32 == RX_HANDLE.load(Ordering::Relaxed) {
                    // SAFETY: Bluedroid owns `value` for the callback's duration.
                    let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                    BLE_UART.on_rx(data, &EVENTS);
                }
            }
            _ => {}
        }
    }

    static mut ADV_STOP_TIMER: esp_timer_handle_t = core::ptr::null_mut();

    unsafe extern "C" fn adv_stop_cb(_arg: *mut core::ffi::c_void) {
        if !BLE_UART.is_connected() {
            unsafe { esp_ble_gap_stop_advertising() };
        }
    }

    /// Stop advertising after `secs` unless a central connected.
    pub(super) unsafe fn arm_adv_timeout(secs: u16) {
        unsafe {
            if ADV_STOP_TIMER.is_null() {
                let args = esp_timer_create_args_t {
                    callback: Some(adv_stop_cb),
                    arg: core::ptr::null_mut(),
                    dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                    name: b"adv_stop\0".as_ptr() as *const _,
                    skip_unhandled_events: true,
                };
                if esp_timer_create(&args, &raw mut ADV_STOP_TIMER) != ESP_OK {
                    log::warn!("BLE: advertising timeout timer unavailable");
                    return;
                }
            }
            esp_timer_stop(ADV_STOP_TIMER);
            esp_timer_start_once(ADV_STOP_TIMER, u64::from(secs) * 1_000_000);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

/// Errors bringing up the BLE stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    StackInitFailed(i32),
}

impl core::fmt::Display for BleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StackInitFailed(rc) => write!(f, "BLE stack initialisation failed (rc={})", rc),
        }
    }
}

/// [`LinkPort`] handle over a [`UartState`].
///
/// Several handles may share one state; the controller's hardware adapter
/// and the log echo sink each hold one.
pub struct BleUart<'a> {
    state: &'a UartState,
    adv_name: heapless::String<BLE_NAME_MAX>,
    adv_secs: u16,
}

impl BleUart<'static> {
    /// Handle over the production [`BLE_UART`] state.
    pub fn global() -> Self {
        Self::with_state(&BLE_UART)
    }
}

impl<'a> BleUart<'a> {
    pub fn with_state(state: &'a UartState) -> Self {
        Self {
            state,
            adv_name: heapless::String::new(),
            adv_secs: 0,
        }
    }

    /// Name and window of the last advertising request.
    pub fn advertising(&self) -> (&str, u16) {
        (&self.adv_name, self.adv_secs)
    }

    /// Bring up the controller, Bluedroid and the UART GATT service.
    #[cfg(target_os = "espidf")]
    pub fn init_stack() -> Result<(), BleError> {
        use esp_idf_svc::sys::*;
        // SAFETY: called once from the main task before advertising starts.
        unsafe {
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK {
                return Err(BleError::StackInitFailed(ret));
            }
            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK {
                return Err(BleError::StackInitFailed(ret));
            }
            let ret = esp_bluedroid_init();
            if ret != ESP_OK {
                return Err(BleError::StackInitFailed(ret));
            }
            let ret = esp_bluedroid_enable();
            if ret != ESP_OK {
                return Err(BleError::StackInitFailed(ret));
            }

            esp_ble_gap_register_callback(Some(gatt::gap_event_handler));
            esp_ble_gatts_register_callback(Some(gatt::gatts_event_handler));
            esp_ble_gatts_app_register(0);
        }
        info!("BLE(espidf): Bluedroid stack initialised");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init_stack() -> Result<(), BleError> {
        info!("BLE(sim): stack init skipped");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_advertise(&mut self) {
        use esp_idf_svc::sys::*;
        let mut name = [0u8; BLE_NAME_MAX + 1];
        name[..self.adv_name.len()].copy_from_slice(self.adv_name.as_bytes());
        // SAFETY: `name` is NUL-terminated; Bluedroid copies it.
        unsafe {
            esp_ble_gap_set_device_name(name.as_ptr() as *const _);
            let mut adv_data: esp_ble_adv_data_t = core::mem::zeroed();
            adv_data.set_scan_rsp = false;
            adv_data.include_name = true;
            adv_data.flag = (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;
            // Advertising starts from the data-set-complete GAP event.
            esp_ble_gap_config_adv_data(&mut adv_data);
            if self.adv_secs > 0 {
                gatt::arm_adv_timeout(self.adv_secs);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_advertise(&mut self) {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.adv_name, SERVICE_UUID
        );
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, chunk: &[u8]) {
        use esp_idf_svc::sys::*;
        let handle = gatt::TX_HANDLE.load(Ordering::Relaxed);
        if handle == 0 {
            return;
        }
        // SAFETY: Bluedroid copies the value before returning.
        unsafe {
            esp_ble_gatts_send_indicate(
                gatt::GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                gatt::CONN_ID.load(Ordering::Relaxed) as u16,
                handle as u16,
                chunk.len() as u16,
                chunk.as_ptr() as *mut u8,
                false,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, chunk: &[u8]) {
        self.state.tx.lock(|tx| {
            let _ = tx.borrow_mut().extend_from_slice(chunk);
        });
    }
}

impl LinkPort for BleUart<'_> {
    fn available(&self) -> usize {
        self.state.available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.state.pop()
    }

    fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    fn write(&mut self, data: &[u8]) {
        if !self.state.is_connected() {
            return;
        }
        for chunk in data.chunks(NOTIFY_CHUNK) {
            self.platform_notify(chunk);
        }
    }

    fn start_advertising(&mut self, name: &str, timeout_secs: u16) {
        self.adv_name.clear();
        for c in name.chars() {
            if self.adv_name.push(c).is_err() {
                warn!("BLE: name '{}' truncated to {} bytes", name, BLE_NAME_MAX);
                break;
            }
        }
        self.adv_secs = timeout_secs;
        self.platform_advertise();
    }
}
