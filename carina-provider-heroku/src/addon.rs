//! Typed add-on records and their mapping to engine attributes

use std::collections::HashMap;

use carina_core::provider::{ProviderError, ProviderResult};
use carina_core::resource::{Resource, ResourceId, State, Value};
use carina_core::schema::ResourceSchema;

use crate::api::{AddOn, AddOnCreateOpts, ConfigVar};
use crate::reader::{flatten_config, reconcile_plan_name};
use crate::resources::{addon_config_schema, addon_schema};

/// Desired state of an `addon` resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOnSpec {
    pub app: String,
    pub plan: String,
    /// Provisioning options, only sent on create
    pub config: Option<HashMap<String, String>>,
}

impl AddOnSpec {
    pub fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        validate(resource, &addon_schema())?;

        Ok(Self {
            app: required_str(resource, "app")?,
            plan: required_str(resource, "plan")?,
            config: resource.attributes.get("config").and_then(string_map),
        })
    }

    pub fn create_opts(&self) -> AddOnCreateOpts {
        AddOnCreateOpts {
            plan: self.plan.clone(),
            confirm: Some(self.app.clone()),
            config: self.config.clone(),
        }
    }
}

/// Observed state of an `addon` resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOnObserved {
    pub id: String,
    pub name: String,
    pub app: String,
    pub plan: String,
    pub provider_id: String,
    pub config_vars: HashMap<String, String>,
    /// Provisioning options the add-on was created with. The platform never
    /// reports them, so they are carried over from the tracked state.
    pub config: Option<HashMap<String, String>>,
}

impl AddOnObserved {
    /// `desired_plan` is the declared plan, used to report the plan name the
    /// way it was written
    pub fn from_remote(addon: AddOn, config: Vec<ConfigVar>, desired_plan: Option<&str>) -> Self {
        Self {
            plan: reconcile_plan_name(desired_plan, &addon.plan.name),
            id: addon.id,
            name: addon.name,
            app: addon.app.name,
            provider_id: addon.provider_id,
            config_vars: flatten_config(config),
            config: None,
        }
    }

    pub fn with_config(mut self, config: Option<HashMap<String, String>>) -> Self {
        self.config = config;
        self
    }

    pub fn into_state(self, id: ResourceId) -> State {
        let state = State::existing(id, HashMap::new())
            .with_identifier(self.id)
            .with_attribute("name", Value::String(self.name))
            .with_attribute("app", Value::String(self.app))
            .with_attribute("plan", Value::String(self.plan))
            .with_attribute("provider_id", Value::String(self.provider_id))
            .with_attribute("config_vars", Value::string_map(self.config_vars));
        match self.config {
            Some(config) => state.with_attribute("config", Value::string_map(config)),
            None => state,
        }
    }
}

/// Result of the `addon_config` data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOnConfigView {
    /// The add-on's own id, which may differ from the name it was looked up by
    pub id: String,
    pub config: HashMap<String, String>,
}

impl AddOnConfigView {
    pub fn into_state(self, id: ResourceId) -> State {
        State::existing(id, HashMap::new())
            .with_identifier(self.id)
            .with_attribute("config", Value::string_map(self.config))
    }
}

/// Add-on name or id an `addon_config` data source looks up
pub fn config_lookup_name(resource: &Resource) -> ProviderResult<String> {
    validate(resource, &addon_config_schema())?;
    required_str(resource, "name")
}

/// String attribute of a previously observed state
pub fn state_str<'a>(state: &'a State, key: &str) -> Option<&'a str> {
    state.attributes.get(key).and_then(Value::as_str)
}

/// Provisioning options recorded in a previously observed state
pub fn tracked_config(state: &State) -> Option<HashMap<String, String>> {
    state.attributes.get("config").and_then(string_map)
}

fn string_map(value: &Value) -> Option<HashMap<String, String>> {
    match value {
        Value::Map(map) => Some(
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
        ),
        _ => None,
    }
}

fn validate(resource: &Resource, schema: &ResourceSchema) -> ProviderResult<()> {
    schema.validate(&resource.attributes).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ProviderError::new(format!("Invalid attributes: {}", messages.join("; ")))
            .for_resource(resource.id.clone())
    })
}

fn required_str(resource: &Resource, key: &str) -> ProviderResult<String> {
    resource
        .get_str(key)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::new(format!("Required attribute '{}' is missing", key))
                .for_resource(resource.id.clone())
        })
}
