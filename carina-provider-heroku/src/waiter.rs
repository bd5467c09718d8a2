//! Provisioning waiter
//!
//! Blocks until an add-on reports `provisioned`, polling a refresh function
//! on a fixed interval under an overall timeout.
//!
//! ```text
//! provisioning --refresh: provisioned--> provisioned   (success)
//! provisioning --refresh: provisioning--> provisioning (sleep, poll again)
//! any          --refresh: other state--> aborted        (UnexpectedState)
//! any          --refresh error---------> aborted        (Refresh)
//! any          --timeout elapsed-------> aborted        (Timeout)
//! provisioned  --entry-----------------> provisioned   (no poll)
//! ```

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;
use tokio::time::Instant;

use crate::lifecycle::{AddOnState, Phase};
use crate::reader::ReadError;

/// Default delay between refreshes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default overall wait budget (20 minutes)
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, Error)]
pub enum WaitError {
    #[error(
        "timeout while waiting for addon ({name}) to be provisioned: still {last_state} after {elapsed:?}"
    )]
    Timeout {
        name: String,
        elapsed: Duration,
        last_state: AddOnState,
    },

    #[error("unexpected state '{state}' for addon ({name}), wanted 'provisioned'")]
    UnexpectedState { name: String, state: AddOnState },

    #[error("error waiting for addon ({name}) to be provisioned: {source}")]
    Refresh {
        name: String,
        #[source]
        source: ReadError,
    },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningWaiter {
    poll_interval: Duration,
    timeout: Duration,
}

impl Default for ProvisioningWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_PROVISION_TIMEOUT)
    }
}

impl ProvisioningWaiter {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for `name` to reach `provisioned`, starting from `current`.
    ///
    /// The first refresh is issued immediately. Returns the number of
    /// refresh calls made, which is zero when `current` is already the target.
    pub async fn wait<F, Fut>(
        &self,
        name: &str,
        current: &AddOnState,
        mut refresh: F,
    ) -> Result<u32, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<AddOnState, ReadError>>,
    {
        if current.is_provisioned() {
            debug!("Addon ({}) is provisioned", name);
            return Ok(0);
        }

        debug!("Waiting for addon ({}) to be provisioned", name);
        let start = Instant::now();
        let mut polls = 0;

        loop {
            let state = refresh().await.map_err(|source| WaitError::Refresh {
                name: name.to_string(),
                source,
            })?;
            polls += 1;

            match state.phase() {
                Phase::Target => {
                    info!(
                        "Addon ({}) provisioned after {} polls ({:?})",
                        name,
                        polls,
                        start.elapsed()
                    );
                    return Ok(polls);
                }
                Phase::Unexpected => {
                    return Err(WaitError::UnexpectedState {
                        name: name.to_string(),
                        state,
                    });
                }
                Phase::Pending => {}
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(WaitError::Timeout {
                    name: name.to_string(),
                    elapsed,
                    last_state: state,
                });
            }

            debug!("Addon ({}) is {}, polling again", name, state);
            tokio::time::sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }
    }
}
