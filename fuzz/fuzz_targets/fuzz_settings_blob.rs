//! Fuzz target: stored config blob decoding
//!
//! Plants arbitrary bytes where `MemorySettings` keeps the encoded config
//! and loads it back, verifying:
//! - No panics under arbitrary byte inputs
//! - Any config that loads also passes validation
//! - A loaded config re-saves and loads back identical
//!
//! cargo fuzz run fuzz_settings_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use lpnode::adapters::nvs::NvsAdapter;
use lpnode::adapters::settings::MemorySettings;
use lpnode::app::ports::{ConfigPort, StoragePort};

fuzz_target!(|data: &[u8]| {
    let Ok(mut store) = NvsAdapter::new() else {
        return;
    };
    if store.write("lpnode", "nodecfg", data).is_err() {
        return;
    }

    let mut settings = MemorySettings::new(store);
    let Ok(cfg) = settings.load() else {
        return;
    };
    assert!(cfg.validate().is_ok());

    settings.save(&cfg).expect("valid config must persist");
    assert_eq!(settings.load().expect("reload"), cfg);
});
