//! Heroku add-on provider implementation
//!
//! Creation runs under the provider's [`CreationGate`] from the create call
//! until the add-on is provisioned and read back. Reads, updates, deletes,
//! and config lookups call the platform directly and may run concurrently.

use std::sync::Arc;

use carina_core::provider::{ProviderError, ProviderResult};
use carina_core::resource::{Resource, ResourceId, State};
use log::{debug, info};

use crate::addon::{
    AddOnConfigView, AddOnObserved, AddOnSpec, config_lookup_name, state_str, tracked_config,
};
use crate::api::{AddOnApi, AddOnUpdateOpts};
use crate::config::ProviderConfig;
use crate::gate::CreationGate;
use crate::lifecycle::AddOnState;
use crate::reader::{
    ReadError, addon_exists, flatten_config, reconcile_plan_name, retrieve, retrieve_addon,
    retrieve_by_app, retrieve_config,
};
use crate::resources::addon_schema;
use crate::waiter::ProvisioningWaiter;

/// Heroku add-on provider
pub struct HerokuProvider {
    api: Arc<dyn AddOnApi>,
    gate: Arc<CreationGate>,
    waiter: ProvisioningWaiter,
}

impl HerokuProvider {
    /// Create a provider with default settings and its own creation gate
    pub fn new(api: Arc<dyn AddOnApi>) -> Self {
        Self::with_config(api, &ProviderConfig::default())
    }

    pub fn with_config(api: Arc<dyn AddOnApi>, config: &ProviderConfig) -> Self {
        Self {
            api,
            gate: Arc::new(CreationGate::new()),
            waiter: config.waiter(),
        }
    }

    /// Share a creation gate with other providers talking to the same platform
    pub fn with_gate(mut self, gate: Arc<CreationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> &Arc<CreationGate> {
        &self.gate
    }

    // =========================================================================
    // Add-on Operations
    // =========================================================================

    /// Create an add-on and wait until it is provisioned
    ///
    /// If the add-on was created but never became provisioned, the returned
    /// error carries its identifier so it can still be tracked.
    pub async fn create_addon(
        &self,
        id: &ResourceId,
        spec: &AddOnSpec,
    ) -> ProviderResult<AddOnObserved> {
        let _permit = self.gate.acquire(&spec.app).await;

        debug!(
            "Addon create configuration: app={}, plan={}",
            spec.app, spec.plan
        );
        let addon = self
            .api
            .create_addon(&spec.app, spec.create_opts())
            .await
            .map_err(|e| {
                ProviderError::new("error creating addon")
                    .with_cause(e)
                    .for_resource(id.clone())
            })?;
        info!("Addon ID: {}", addon.id);

        let api = self.api.as_ref();
        let app = spec.app.as_str();
        let addon_id = addon.id.as_str();
        self.waiter
            .wait(&addon.name, &AddOnState::Provisioning, move || async move {
                retrieve_by_app(api, app, addon_id)
                    .await
                    .map(|(refreshed, _)| refreshed.state)
            })
            .await
            .map_err(|e| {
                ProviderError::new(format!("error provisioning addon ({})", addon.id))
                    .with_cause(e)
                    .with_identifier(addon_id)
                    .for_resource(id.clone())
            })?;
        info!("Addon provisioned: {}", addon.id);

        self.read_addon(id, addon_id, Some(spec.plan.as_str()))
            .await
            .map(|observed| observed.with_config(spec.config.clone()))
            .map_err(|e| e.with_identifier(addon_id))
    }

    /// Read the full current state of an add-on
    pub async fn read_addon(
        &self,
        id: &ResourceId,
        identifier: &str,
        desired_plan: Option<&str>,
    ) -> ProviderResult<AddOnObserved> {
        let (addon, config) = retrieve(self.api.as_ref(), identifier)
            .await
            .map_err(|e| read_error(id, e))?;
        Ok(AddOnObserved::from_remote(addon, config, desired_plan))
    }

    /// Change an add-on's plan
    ///
    /// The platform may answer with a new add-on id, which replaces the
    /// tracked one in the returned state.
    pub async fn update_addon(
        &self,
        id: &ResourceId,
        identifier: &str,
        spec: &AddOnSpec,
    ) -> ProviderResult<AddOnObserved> {
        let updated = self
            .api
            .update_addon(
                &spec.app,
                identifier,
                AddOnUpdateOpts {
                    plan: spec.plan.clone(),
                },
            )
            .await
            .map_err(|e| {
                ProviderError::new("error updating addon")
                    .with_cause(e)
                    .for_resource(id.clone())
            })?;

        if updated.id != identifier {
            info!("Addon ID changed from {} to {}", identifier, updated.id);
        }

        self.read_addon(id, &updated.id, Some(spec.plan.as_str()))
            .await
            .map(|observed| observed.with_config(spec.config.clone()))
    }

    pub async fn delete_addon(
        &self,
        id: &ResourceId,
        app: &str,
        identifier: &str,
    ) -> ProviderResult<()> {
        info!("Deleting addon: {}", identifier);
        self.api.delete_addon(app, identifier).await.map_err(|e| {
            ProviderError::new("error deleting addon")
                .with_cause(e)
                .for_resource(id.clone())
        })?;
        Ok(())
    }

    pub async fn addon_exists(&self, id: &ResourceId, identifier: &str) -> ProviderResult<bool> {
        addon_exists(self.api.as_ref(), identifier)
            .await
            .map_err(|e| {
                ProviderError::new("error checking addon existence")
                    .with_cause(e)
                    .for_resource(id.clone())
            })
    }

    /// Config vars of an add-on, once it is provisioned
    pub async fn read_addon_config(
        &self,
        id: &ResourceId,
        name: &str,
    ) -> ProviderResult<AddOnConfigView> {
        let api = self.api.as_ref();
        let addon = retrieve_addon(api, name)
            .await
            .map_err(|e| read_error(id, e))?;

        let addon_id = addon.id.as_str();
        self.waiter
            .wait(&addon.name, &addon.state, move || async move {
                retrieve_addon(api, addon_id)
                    .await
                    .map(|refreshed| refreshed.state)
            })
            .await
            .map_err(|e| {
                ProviderError::new(format!("error provisioning addon ({})", addon.name))
                    .with_cause(e)
                    .for_resource(id.clone())
            })?;

        debug!("Retrieving addon ({}) config", addon.name);
        let config = retrieve_config(api, addon_id).await.map_err(|e| {
            ProviderError::new(format!("error retrieving addon ({}) config", addon.name))
                .with_cause(e.into_api_error())
                .for_resource(id.clone())
        })?;

        Ok(AddOnConfigView {
            id: addon.id.clone(),
            config: flatten_config(config),
        })
    }

    // =========================================================================
    // Engine-facing Operations
    // =========================================================================

    /// Read an add-on, keeping the plan name and provisioning options of the
    /// `prior` state it was last tracked with
    pub async fn read_resource(
        &self,
        id: ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id));
        };
        let tracked_plan = prior.and_then(|state| state_str(state, "plan"));

        match retrieve(self.api.as_ref(), identifier).await {
            Ok((addon, config)) => Ok(AddOnObserved::from_remote(addon, config, tracked_plan)
                .with_config(prior.and_then(tracked_config))
                .into_state(id)),
            Err(e) if e.is_not_found() => {
                debug!("Addon {} no longer exists", identifier);
                Ok(State::not_found(id))
            }
            Err(e) => Err(read_error(&id, e)),
        }
    }

    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let spec = AddOnSpec::from_resource(&resource)?;
        let observed = self.create_addon(&resource.id, &spec).await?;
        Ok(observed.into_state(resource.id))
    }

    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        from: State,
        to: Resource,
    ) -> ProviderResult<State> {
        let spec = AddOnSpec::from_resource(&to)?;

        let mut replaced = Vec::new();
        if state_str(&from, "app").is_some_and(|app| app != spec.app) {
            replaced.push("app");
        }
        if tracked_config(&from) != spec.config {
            replaced.push("config");
        }
        if addon_schema().requires_replacement(replaced.as_slice()) {
            return Err(ProviderError::new(format!(
                "Update not supported for {}, delete and recreate",
                replaced.join(", ")
            ))
            .for_resource(id));
        }

        let plan_unchanged = state_str(&from, "plan")
            .is_some_and(|current| reconcile_plan_name(Some(spec.plan.as_str()), current) == spec.plan);
        let observed = if plan_unchanged {
            debug!("Addon {} plan unchanged", identifier);
            self.read_addon(&id, identifier, Some(spec.plan.as_str()))
                .await?
                .with_config(spec.config.clone())
        } else {
            self.update_addon(&id, identifier, &spec).await?
        };
        Ok(observed.into_state(id))
    }

    pub async fn delete_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> ProviderResult<()> {
        let app = state_str(from, "app").ok_or_else(|| {
            ProviderError::new("Cannot delete addon without a known app").for_resource(id.clone())
        })?;
        self.delete_addon(id, app, identifier).await
    }

    pub async fn read_data_source(&self, resource: Resource) -> ProviderResult<State> {
        let name = config_lookup_name(&resource)?;
        let view = self.read_addon_config(&resource.id, &name).await?;
        Ok(view.into_state(resource.id))
    }
}

fn read_error(id: &ResourceId, e: ReadError) -> ProviderError {
    let message = match e {
        ReadError::AddOn(_) => "error retrieving addon",
        ReadError::Config(_) => "error retrieving addon config",
    };
    ProviderError::new(message)
        .with_cause(e.into_api_error())
        .for_resource(id.clone())
}
