//! Persistent configuration over any key-value store.
//!
//! [`MemorySettings`] implements [`ConfigPort`] by keeping the
//! postcard-encoded [`NodeConfig`] as a single blob in a [`StoragePort`].
//! Values are validated before they are written and again after they are
//! read back, so a stale or hand-edited blob never reaches the controller.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::NodeConfig;

const CONFIG_NAMESPACE: &str = "lpnode";
const CONFIG_KEY: &str = "nodecfg";

/// Upper bound on the encoded config blob.
const MAX_BLOB_SIZE: usize = 128;

pub struct MemorySettings<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> MemorySettings<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Drop the stored blob; the next load yields defaults.
    pub fn clear(&mut self) -> Result<(), ConfigError> {
        self.storage.delete(CONFIG_NAMESPACE, CONFIG_KEY)?;
        Ok(())
    }
}

impl<S: StoragePort> ConfigPort for MemorySettings<S> {
    fn load(&self) -> Result<NodeConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = match self.storage.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("settings: no stored config, using defaults");
                return Ok(NodeConfig::default());
            }
            Err(e) => {
                warn!("settings: read failed ({})", e);
                return Err(e.into());
            }
        };

        let cfg: NodeConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("settings: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let bytes = postcard::to_slice(config, &mut buf).map_err(|_| ConfigError::IoError)?;
        self.storage.write(CONFIG_NAMESPACE, CONFIG_KEY, bytes)?;
        info!("settings: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
