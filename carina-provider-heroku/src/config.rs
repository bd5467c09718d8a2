//! Provider configuration
//!
//! Built from the attributes of the provider block, e.g.
//!
//! ```text
//! provider heroku {
//!     poll_interval_secs     = 5
//!     provision_timeout_secs = 1200
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use carina_core::resource::Value;
use thiserror::Error;

use crate::waiter::{DEFAULT_POLL_INTERVAL, DEFAULT_PROVISION_TIMEOUT, ProvisioningWaiter};

pub const POLL_INTERVAL_KEY: &str = "poll_interval_secs";
pub const PROVISION_TIMEOUT_KEY: &str = "provision_timeout_secs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider attribute '{key}': {reason}")]
    InvalidAttribute { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Delay between provisioning state refreshes
    pub poll_interval: Duration,
    /// Overall budget for an add-on to become provisioned
    pub provision_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            provision_timeout: DEFAULT_PROVISION_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            poll_interval: positive_secs(attributes, POLL_INTERVAL_KEY)?
                .unwrap_or(defaults.poll_interval),
            provision_timeout: positive_secs(attributes, PROVISION_TIMEOUT_KEY)?
                .unwrap_or(defaults.provision_timeout),
        })
    }

    pub fn waiter(&self) -> ProvisioningWaiter {
        ProvisioningWaiter::new(self.poll_interval, self.provision_timeout)
    }
}

fn positive_secs(
    attributes: &HashMap<String, Value>,
    key: &str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = attributes.get(key) else {
        return Ok(None);
    };
    let secs = value
        .as_int()
        .ok_or_else(|| ConfigError::invalid(key, "expected an integer"))?;
    if secs <= 0 {
        return Err(ConfigError::invalid(
            key,
            format!("must be a positive number of seconds, got {}", secs),
        ));
    }
    Ok(Some(Duration::from_secs(secs as u64)))
}
