//! Resource type definitions and attribute schemas

use carina_core::provider::ResourceType;
use carina_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub const ADDON_TYPE: &str = "addon";
pub const ADDON_CONFIG_TYPE: &str = "addon_config";

fn string_map() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

/// `addon` resource
pub struct AddOnType;

impl ResourceType for AddOnType {
    fn name(&self) -> &'static str {
        ADDON_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        addon_schema()
    }
}

/// `addon_config` data source
pub struct AddOnConfigType;

impl ResourceType for AddOnConfigType {
    fn name(&self) -> &'static str {
        ADDON_CONFIG_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        addon_config_schema()
    }
}

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(AddOnType), Box::new(AddOnConfigType)]
}

pub fn addon_schema() -> ResourceSchema {
    ResourceSchema::new(ADDON_TYPE)
        .with_description("An add-on attached to an app")
        .attribute(
            AttributeSchema::new("app", AttributeType::String)
                .required()
                .force_new()
                .with_description("Name of the app the add-on is attached to"),
        )
        .attribute(
            AttributeSchema::new("plan", AttributeType::String)
                .required()
                .with_description("Add-on plan, e.g. heroku-postgresql:hobby-dev"),
        )
        .attribute(
            AttributeSchema::new("config", string_map())
                .force_new()
                .with_description("Provisioning options passed on create"),
        )
        .attribute(AttributeSchema::new("provider_id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("config_vars", string_map()).computed())
}

pub fn addon_config_schema() -> ResourceSchema {
    ResourceSchema::new(ADDON_CONFIG_TYPE)
        .with_description("Config vars of a provisioned add-on")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Add-on name or id"),
        )
        .attribute(AttributeSchema::new("config", string_map()).computed())
}
