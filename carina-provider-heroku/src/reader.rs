//! Resource reader
//!
//! Fetches an add-on's primary record together with its config list. Both
//! calls must succeed; no partial result is returned.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::api::{AddOn, AddOnApi, ApiError, ConfigVar, ListRange};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("error retrieving addon: {0}")]
    AddOn(#[source] ApiError),

    #[error("error retrieving addon config: {0}")]
    Config(#[source] ApiError),
}

impl ReadError {
    /// True when the primary record itself is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReadError::AddOn(e) if e.is_not_found())
    }

    pub fn into_api_error(self) -> ApiError {
        match self {
            ReadError::AddOn(e) | ReadError::Config(e) => e,
        }
    }
}

pub type ReadResult<T> = Result<T, ReadError>;

/// Fetch only the primary record
pub async fn retrieve_addon(api: &dyn AddOnApi, id: &str) -> ReadResult<AddOn> {
    api.addon_info(id).await.map_err(ReadError::AddOn)
}

/// Fetch the primary record and config list of an add-on
pub async fn retrieve(api: &dyn AddOnApi, id: &str) -> ReadResult<(AddOn, Vec<ConfigVar>)> {
    let addon = retrieve_addon(api, id).await?;
    let config = retrieve_config(api, id).await?;
    Ok((addon, config))
}

/// Like [`retrieve`], scoped to the owning app
pub async fn retrieve_by_app(
    api: &dyn AddOnApi,
    app: &str,
    id: &str,
) -> ReadResult<(AddOn, Vec<ConfigVar>)> {
    let addon = api
        .addon_info_by_app(app, id)
        .await
        .map_err(ReadError::AddOn)?;
    let config = retrieve_config(api, id).await?;
    Ok((addon, config))
}

/// Fetch the config list in the platform's descending order
pub async fn retrieve_config(api: &dyn AddOnApi, id: &str) -> ReadResult<Vec<ConfigVar>> {
    api.list_addon_config(id, ListRange::descending())
        .await
        .map_err(ReadError::Config)
}

/// Existence check: only the platform's not-found error means "gone"
pub async fn addon_exists(api: &dyn AddOnApi, id: &str) -> Result<bool, ApiError> {
    match api.addon_info(id).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Flatten a config list into a map, skipping entries without a value
pub fn flatten_config(vars: impl IntoIterator<Item = ConfigVar>) -> HashMap<String, String> {
    let mut config = HashMap::new();
    for var in vars {
        match var.value {
            Some(value) => {
                config.insert(var.name, value);
            }
            None => debug!("Skipping config var {} without a value", var.name),
        }
    }
    config
}

/// Plan name to report for an add-on
///
/// A plan declared without a variant (e.g. "heroku-postgresql") accepts
/// whatever variant the platform chose, so the variant is dropped from the
/// remote name to keep the declaration and the observed state equal.
pub fn reconcile_plan_name(desired: Option<&str>, remote: &str) -> String {
    match desired {
        Some(desired) if !desired.is_empty() && !desired.contains(':') => remote
            .split_once(':')
            .map(|(service, _)| service)
            .unwrap_or(remote)
            .to_string(),
        _ => remote.to_string(),
    }
}
