//! Periodic wake timer using ESP-IDF's esp_timer API.
//!
//! One periodic timer signals [`EventKind::Status`](crate::events::EventKind)
//! on the global bus every `send_interval_secs`. On simulation targets the
//! host drives status ticks itself.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR); the
//! callback only does one atomic `fetch_or`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use super::hw_init::HwInitError;

#[cfg(target_os = "espidf")]
static mut WAKE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: WAKE_TIMER is written once in `start_wake_timer()` before any
/// callback fires. Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn wake_timer() -> esp_timer_handle_t {
    unsafe { WAKE_TIMER }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn wake_tick_cb(_arg: *mut core::ffi::c_void) {
    crate::events::EVENTS.status_tick();
}

/// Period of the wake timer in microseconds.
pub fn period_us(interval_secs: u32) -> u64 {
    u64::from(interval_secs.max(1)) * 1_000_000
}

/// Start the periodic wake timer.
#[cfg(target_os = "espidf")]
pub fn start_wake_timer(interval_secs: u32) -> Result<(), HwInitError> {
    // SAFETY: WAKE_TIMER is written here once at boot from the main task
    // before any callback fires.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(wake_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"wake\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut WAKE_TIMER);
        if ret != ESP_OK {
            return Err(HwInitError::TimerFailed(ret));
        }
        let ret = esp_timer_start_periodic(wake_timer(), period_us(interval_secs));
        if ret != ESP_OK {
            return Err(HwInitError::TimerFailed(ret));
        }
    }
    info!("hw_timer: wake timer started ({}s)", interval_secs);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_wake_timer(interval_secs: u32) -> Result<(), HwInitError> {
    log::info!(
        "hw_timer(sim): wake timer not started ({}s, ticks driven by host)",
        interval_secs
    );
    Ok(())
}
