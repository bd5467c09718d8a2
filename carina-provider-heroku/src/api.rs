//! Platform API client seam
//!
//! The provider talks to the platform only through [`AddOnApi`]. Transport,
//! authentication, and retries live in the implementation handed to
//! [`crate::HerokuProvider`]; records mirror the platform's JSON shapes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::AddOnState;

/// Platform error id signalling a missing resource
pub const NOT_FOUND_ERROR_ID: &str = "not_found";

/// Errors surfaced by an [`AddOnApi`] implementation
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The platform reported that the requested resource does not exist
    #[error("{message}")]
    NotFound { message: String },

    /// Any other structured platform error (validation, auth, rate limit, ...)
    #[error("{message} ({id})")]
    Platform { id: String, message: String },

    /// The request never produced a structured platform response
    #[error("transport error: {0}")]
    Transport(String),
}

/// Error body returned by the platform on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub id: String,
    pub message: String,
}

impl ApiError {
    pub fn platform(id: impl Into<String>, message: impl Into<String>) -> Self {
        let id = id.into();
        let message = message.into();
        if id == NOT_FOUND_ERROR_ID {
            Self::NotFound { message }
        } else {
            Self::Platform { id, message }
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Build an error from a raw platform error body
    ///
    /// Bodies that are not valid error JSON are reported as transport errors.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(body) => Self::platform(body.id, body.message),
            Err(e) => Self::transport(format!("unreadable error response: {}", e)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRef {
    pub id: String,
    /// Qualified plan name, e.g. "heroku-postgresql:hobby-dev"
    pub name: String,
}

/// An add-on as returned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub app: AppRef,
    pub plan: PlanRef,
    pub provider_id: String,
    pub state: AddOnState,
}

/// One entry of an add-on's config list; the platform may send a null value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVar {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddOnCreateOpts {
    pub plan: String,
    /// Name of the owning app, required by the platform for billable plans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOnUpdateOpts {
    pub plan: String,
}

/// Ordering of list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListRange {
    pub descending: bool,
}

impl ListRange {
    pub fn descending() -> Self {
        Self { descending: true }
    }
}

/// Add-on endpoints of the platform API
///
/// One method per round trip. Implementations must be safe to call from
/// many tasks at once.
#[async_trait]
pub trait AddOnApi: Send + Sync {
    async fn create_addon(&self, app: &str, opts: AddOnCreateOpts) -> ApiResult<AddOn>;

    /// Look up an add-on by id or globally unique name
    async fn addon_info(&self, id: &str) -> ApiResult<AddOn>;

    /// Look up an add-on scoped to an app
    async fn addon_info_by_app(&self, app: &str, id: &str) -> ApiResult<AddOn>;

    /// Change an add-on's plan; the returned add-on may carry a new id
    async fn update_addon(
        &self,
        app: &str,
        id: &str,
        opts: AddOnUpdateOpts,
    ) -> ApiResult<AddOn>;

    async fn delete_addon(&self, app: &str, id: &str) -> ApiResult<AddOn>;

    async fn list_addon_config(&self, id: &str, range: ListRange) -> ApiResult<Vec<ConfigVar>>;
}
