//! Send-failure counter and restart policy.
//!
//! Every unacknowledged confirmed uplink bumps the counter. When it hits
//! the configured threshold the controller restarts the node, which
//! recovers a wedged transceiver or a lost network session by rejoining
//! from scratch. The threshold is a hard ceiling, not a backoff.
//!
//! Unconfirmed uplinks carry no delivery information and never touch the
//! counter.

use crate::config::AckPolicy;

/// What one tx-finished event means for recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxVerdict {
    /// Unconfirmed uplink; nothing to account for.
    Informational,
    /// Confirmed and acknowledged.
    Acked { failures: u8 },
    /// Confirmed but not acknowledged; below the threshold.
    Failed { failures: u8 },
    /// Threshold reached; restart now.
    Restart { failures: u8 },
}

/// Counts unacknowledged confirmed uplinks.
#[derive(Debug, Clone)]
pub struct FailureCounter {
    failures: u8,
    threshold: u8,
    policy: AckPolicy,
}

impl FailureCounter {
    pub fn new(threshold: u8, policy: AckPolicy) -> Self {
        Self {
            failures: 0,
            threshold,
            policy,
        }
    }

    /// Current count.
    pub fn failures(&self) -> u8 {
        self.failures
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn policy(&self) -> AckPolicy {
        self.policy
    }

    /// Account for one finished uplink.
    ///
    /// Returning [`TxVerdict::Restart`] also clears the counter, so a
    /// threshold crossing is reported exactly once.
    pub fn record(&mut self, confirmed: bool, acked: bool) -> TxVerdict {
        if !confirmed {
            return TxVerdict::Informational;
        }

        if acked {
            if self.policy == AckPolicy::ResetOnAck {
                self.failures = 0;
            }
            return TxVerdict::Acked {
                failures: self.failures,
            };
        }

        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.threshold {
            let failures = self.failures;
            self.failures = 0;
            TxVerdict::Restart { failures }
        } else {
            TxVerdict::Failed {
                failures: self.failures,
            }
        }
    }

    /// Swap threshold and policy, keeping the current count.
    pub fn reconfigure(&mut self, threshold: u8, policy: AckPolicy) {
        self.threshold = threshold;
        self.policy = policy;
    }
}
