//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] over the ESP-IDF NVS partition. Each call
//! opens the namespace through an RAII `Handle` that closes on drop;
//! writes and erases are committed before the handle goes away.
//!
//! The host backend follows the same rules as the flash one: names are
//! cut to the NVS limit, and reading a blob into a buffer that is too
//! small fails instead of returning a prefix.

use log::info;

use crate::app::ports::{StorageError, StoragePort};

/// NVS keys and namespaces are limited to 15 bytes plus NUL.
const NVS_NAME_MAX: usize = 15;

/// NUL-terminated copy of an NVS name, truncated to the NVS limit.
fn c_name(name: &str) -> [u8; NVS_NAME_MAX + 1] {
    let mut buf = [0u8; NVS_NAME_MAX + 1];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NVS_NAME_MAX);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

// ── Flash backend ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod flash {
    use esp_idf_svc::sys::*;
    use log::warn;

    use super::c_name;
    use crate::app::ports::StorageError;

    pub fn init() -> Result<(), StorageError> {
        // SAFETY: called from the main task before any other NVS access.
        unsafe {
            let ret = nvs_flash_init();
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if nvs_flash_erase() != ESP_OK as esp_err_t || nvs_flash_init() != ESP_OK as esp_err_t {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as esp_err_t {
                return Err(StorageError::IoError);
            }
        }
        Ok(())
    }

    pub fn to_storage_error(code: esp_err_t) -> StorageError {
        if code == ESP_ERR_NVS_NOT_FOUND as esp_err_t {
            StorageError::NotFound
        } else if code == ESP_ERR_NVS_NOT_ENOUGH_SPACE as esp_err_t {
            StorageError::Full
        } else {
            StorageError::IoError
        }
    }

    /// An open namespace, closed on drop.
    pub struct Handle(nvs_handle_t);

    impl Handle {
        pub fn open(namespace: &str, write: bool) -> Result<Self, esp_err_t> {
            let ns = c_name(namespace);
            let mode = if write {
                nvs_open_mode_t_NVS_READWRITE
            } else {
                nvs_open_mode_t_NVS_READONLY
            };
            let mut raw: nvs_handle_t = 0;
            // SAFETY: `ns` is NUL-terminated and outlives the call.
            let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut raw) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(Self(raw))
        }

        pub fn get_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, esp_err_t> {
            let key = c_name(key);
            let mut size = buf.len();
            // SAFETY: `size` bounds the write into `buf`.
            let ret = unsafe {
                nvs_get_blob(self.0, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(size)
        }

        pub fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), esp_err_t> {
            let key = c_name(key);
            // SAFETY: pointer and length come from the same slice.
            let ret =
                unsafe { nvs_set_blob(self.0, key.as_ptr().cast(), data.as_ptr().cast(), data.len()) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            self.commit()
        }

        pub fn erase(&self, key: &str) -> Result<(), esp_err_t> {
            let key = c_name(key);
            // SAFETY: `key` is NUL-terminated.
            let ret = unsafe { nvs_erase_key(self.0, key.as_ptr().cast()) };
            if ret != ESP_OK as esp_err_t && ret != ESP_ERR_NVS_NOT_FOUND as esp_err_t {
                return Err(ret);
            }
            self.commit()
        }

        pub fn contains(&self, key: &str) -> bool {
            let key = c_name(key);
            // SAFETY: a null type pointer is allowed by nvs_find_key.
            unsafe { nvs_find_key(self.0, key.as_ptr().cast(), core::ptr::null_mut()) == ESP_OK as esp_err_t }
        }

        fn commit(&self) -> Result<(), esp_err_t> {
            // SAFETY: handle is open for writing.
            let ret = unsafe { nvs_commit(self.0) };
            if ret != ESP_OK as esp_err_t {
                return Err(ret);
            }
            Ok(())
        }
    }

    impl Drop for Handle {
        fn drop(&mut self) {
            // SAFETY: the handle was opened by `Handle::open`.
            unsafe { nvs_close(self.0) };
        }
    }
}

// ── Adapter ───────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
type SimKey = ([u8; NVS_NAME_MAX + 1], [u8; NVS_NAME_MAX + 1]);

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::collections::BTreeMap<SimKey, Vec<u8>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            flash::init()?;
            info!("nvs: flash partition ready");
            Ok(Self {})
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("nvs(sim): in-memory backend");
            Ok(Self {
                store: std::collections::BTreeMap::new(),
            })
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn sim_key(namespace: &str, key: &str) -> SimKey {
        (c_name(namespace), c_name(key))
    }
}

#[cfg(target_os = "espidf")]
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        flash::Handle::open(namespace, false)
            .and_then(|h| h.get_blob(key, buf))
            .map_err(flash::to_storage_error)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        flash::Handle::open(namespace, true)
            .and_then(|h| h.set_blob(key, data))
            .map_err(|e| {
                log::warn!("nvs: write {}/{} failed ({})", namespace, key, e);
                flash::to_storage_error(e)
            })
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match flash::Handle::open(namespace, true) {
            Ok(h) => h.erase(key).map_err(flash::to_storage_error),
            // A namespace that was never written holds no keys.
            Err(e) if flash::to_storage_error(e) == StorageError::NotFound => Ok(()),
            Err(e) => Err(flash::to_storage_error(e)),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        flash::Handle::open(namespace, false).is_ok_and(|h| h.contains(key))
    }
}

#[cfg(not(target_os = "espidf"))]
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .store
            .get(&Self::sim_key(namespace, key))
            .ok_or(StorageError::NotFound)?;
        let dst = buf.get_mut(..data.len()).ok_or(StorageError::IoError)?;
        dst.copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(Self::sim_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::sim_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::sim_key(namespace, key))
    }
}
