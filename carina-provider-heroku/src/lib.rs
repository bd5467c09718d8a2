//! Carina Heroku Provider
//!
//! Manages Heroku add-ons: creates them, waits until they are provisioned,
//! and reads back their state and config vars.
//!
//! ## Module Structure
//!
//! - `api` - Platform API client seam and records
//! - `lifecycle` - Add-on lifecycle states
//! - `waiter` - Provisioning waiter
//! - `gate` - Creation gate serializing add-on creation
//! - `reader` - Add-on retrieval and config flattening
//! - `addon` - Typed desired/observed records and engine attribute mapping
//! - `resources` - Resource type definitions and schemas
//! - `config` - Provider configuration
//! - `provider` - HerokuProvider implementation

pub mod addon;
pub mod api;
pub mod config;
pub mod gate;
pub mod lifecycle;
pub mod provider;
pub mod reader;
pub mod resources;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use api::{AddOnApi, ApiError};
pub use config::ProviderConfig;
pub use gate::CreationGate;
pub use lifecycle::AddOnState;
pub use provider::HerokuProvider;
pub use waiter::{ProvisioningWaiter, WaitError};

use carina_core::provider::{BoxFuture, DataSource, Provider, ProviderResult, ResourceType};
use carina_core::resource::{Resource, ResourceId, State};

use resources::{ADDON_CONFIG_TYPE, resource_types};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for HerokuProvider {
    fn name(&self) -> &'static str {
        "heroku"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        let prior = prior.cloned();
        Box::pin(async move {
            self.read_resource(id, identifier.as_deref(), prior.as_ref())
                .await
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, from, to).await })
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        Box::pin(async move { self.delete_resource(&id, &identifier, &from).await })
    }

    fn exists(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<bool>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.addon_exists(&id, &identifier).await })
    }
}

impl DataSource for HerokuProvider {
    fn data_source_name(&self) -> &'static str {
        ADDON_CONFIG_TYPE
    }

    fn read_data(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.read_data_source(resource).await })
    }
}
