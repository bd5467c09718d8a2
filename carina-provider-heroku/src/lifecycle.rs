//! Add-on lifecycle states as reported by the platform

use std::fmt;

use serde::{Deserialize, Serialize};

pub const STATE_PROVISIONING: &str = "provisioning";
pub const STATE_PROVISIONED: &str = "provisioned";
pub const STATE_DEPROVISIONED: &str = "deprovisioned";

/// Remote-reported stage of an add-on's provisioning
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AddOnState {
    Provisioning,
    Provisioned,
    Deprovisioned,
    /// Any state this provider does not know about
    Other(String),
}

/// How the provisioning waiter treats an observed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Keep polling
    Pending,
    /// Stop with success
    Target,
    /// Neither pending nor target: abort the wait
    Unexpected,
}

impl AddOnState {
    pub fn as_str(&self) -> &str {
        match self {
            AddOnState::Provisioning => STATE_PROVISIONING,
            AddOnState::Provisioned => STATE_PROVISIONED,
            AddOnState::Deprovisioned => STATE_DEPROVISIONED,
            AddOnState::Other(s) => s.as_str(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            AddOnState::Provisioning => Phase::Pending,
            AddOnState::Provisioned => Phase::Target,
            AddOnState::Deprovisioned | AddOnState::Other(_) => Phase::Unexpected,
        }
    }

    pub fn is_provisioned(&self) -> bool {
        self.phase() == Phase::Target
    }
}

impl From<String> for AddOnState {
    fn from(s: String) -> Self {
        match s.as_str() {
            STATE_PROVISIONING => AddOnState::Provisioning,
            STATE_PROVISIONED => AddOnState::Provisioned,
            STATE_DEPROVISIONED => AddOnState::Deprovisioned,
            _ => AddOnState::Other(s),
        }
    }
}

impl From<&str> for AddOnState {
    fn from(s: &str) -> Self {
        AddOnState::from(s.to_string())
    }
}

impl From<AddOnState> for String {
    fn from(state: AddOnState) -> Self {
        match state {
            AddOnState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AddOnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
