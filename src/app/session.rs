//! Join / session handling.
//!
//! On a successful join the session keys and device address are copied
//! out of the stack and logged; nothing else in the controller consumes
//! them. A failed join leaves the previous session record untouched and,
//! under [`RejoinPolicy::Manual`], does nothing further: an operator (or
//! the console) must request the next join.

use log::{debug, error, info, warn};

use crate::config::RejoinPolicy;

use super::hex::HexKey;
use super::ports::LoRaWanPort;

/// Session data captured at join time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub nwk_skey: [u8; 16],
    pub app_skey: [u8; 16],
    pub dev_addr: u32,
}

/// Outcome of one join-finished event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinVerdict {
    Joined(SessionInfo),
    /// `rejoin` is true when another join request was issued.
    Failed { rejoin: bool },
}

/// Last known session plus the consecutive join failure count.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session: Option<SessionInfo>,
    join_failures: u8,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session from the most recent successful join.
    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    /// Consecutive failed joins since the last success.
    pub fn join_failures(&self) -> u8 {
        self.join_failures
    }

    /// Handle a join-finished event.
    pub fn on_join_finished(
        &mut self,
        success: bool,
        policy: RejoinPolicy,
        radio: &mut impl LoRaWanPort,
    ) -> JoinVerdict {
        if success {
            let keys = radio.session_keys();
            let info = SessionInfo {
                nwk_skey: keys.nwk_skey,
                app_skey: keys.app_skey,
                dev_addr: radio.device_address(),
            };
            self.session = Some(info);
            self.join_failures = 0;

            info!("[APP] Successfully joined network, DevAddr {:08X}", info.dev_addr);
            debug!("[APP] NwkSKey {}", HexKey(&info.nwk_skey));
            debug!("[APP] AppSKey {}", HexKey(&info.app_skey));
            return JoinVerdict::Joined(info);
        }

        self.join_failures = self.join_failures.saturating_add(1);
        warn!("[APP] Join network failed ({} in a row)", self.join_failures);

        let rejoin = match policy {
            RejoinPolicy::Manual => false,
            RejoinPolicy::Bounded { max_attempts } if self.join_failures < max_attempts => {
                match radio.join() {
                    Ok(()) => {
                        info!(
                            "[APP] Rejoin requested ({}/{})",
                            self.join_failures, max_attempts
                        );
                        true
                    }
                    Err(e) => {
                        error!("[APP] Rejoin request failed: {}", e);
                        false
                    }
                }
            }
            RejoinPolicy::Bounded { max_attempts } => {
                warn!("[APP] Giving up after {} join attempts", max_attempts);
                false
            }
        };

        JoinVerdict::Failed { rejoin }
    }
}
