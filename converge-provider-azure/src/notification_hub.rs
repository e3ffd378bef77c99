//! notification_hub_namespace resource

use std::collections::HashMap;

use converge_core::provider::{ResourceSchema, ResourceType};
use converge_core::resource::{Resource, State, Value};
use serde_json::json;

use crate::ids::AzureResourceId;
use crate::provider::ArmResource;
use crate::resources::{
    NAMESPACE_SKUS, NAMESPACE_TYPES, NOTIFICATION_HUB_NAMESPACE_CONFIG,
    NotificationHubNamespaceType, ResourceConfig,
};
use crate::utils::{expand_tags, flatten_tags, normalize_location, string_at};
use crate::validation::{ValidationResult, collect, validate_one_of};

pub struct NotificationHubNamespace;

impl ArmResource for NotificationHubNamespace {
    fn config(&self) -> ResourceConfig {
        NOTIFICATION_HUB_NAMESPACE_CONFIG
    }

    fn schema(&self) -> ResourceSchema {
        NotificationHubNamespaceType.schema()
    }

    fn validate(&self, resource: &Resource) -> ValidationResult {
        collect([
            validate_one_of(&resource.attributes, "sku_name", NAMESPACE_SKUS),
            validate_one_of(&resource.attributes, "namespace_type", NAMESPACE_TYPES),
        ])
    }

    fn normalize(&self, attributes: &mut HashMap<String, Value>) {
        attributes
            .entry("enabled".to_string())
            .or_insert(Value::Bool(true));
        if let Some(Value::String(location)) = attributes.get_mut("location") {
            *location = normalize_location(location);
        }
    }

    fn expand(&self, resource: &Resource) -> serde_json::Value {
        json!({
            "location": resource.get_str("location").map(normalize_location),
            "sku": { "name": resource.get_str("sku_name") },
            "properties": {
                "namespaceType": resource.get_str("namespace_type"),
                "enabled": resource.get_bool("enabled").unwrap_or(true),
            },
            "tags": expand_tags(resource.attributes.get("tags")),
        })
    }

    fn expand_patch(&self, from: &State, to: &Resource) -> serde_json::Value {
        let mut patch = json!({
            "properties": {
                "namespaceType": to.get_str("namespace_type"),
                "enabled": to.get_bool("enabled").unwrap_or(true),
            },
        });

        if from.attributes.get("sku_name") != to.attributes.get("sku_name") {
            patch["sku"] = json!({ "name": to.get_str("sku_name") });
        }
        if from.attributes.get("tags") != to.attributes.get("tags") {
            patch["tags"] = expand_tags(to.attributes.get("tags"));
        }
        patch
    }

    fn flatten(&self, id: &AzureResourceId, body: &serde_json::Value) -> HashMap<String, Value> {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String(id.name.clone()));
        attributes.insert(
            "resource_group_name".to_string(),
            Value::String(id.resource_group.clone()),
        );

        if let Some(location) = string_at(body, "/location") {
            attributes.insert(
                "location".to_string(),
                Value::String(normalize_location(&location)),
            );
        }
        if let Some(sku) = string_at(body, "/sku/name") {
            attributes.insert("sku_name".to_string(), Value::String(sku));
        }
        if let Some(enabled) = body.pointer("/properties/enabled").and_then(|v| v.as_bool()) {
            attributes.insert("enabled".to_string(), Value::Bool(enabled));
        }
        if let Some(namespace_type) = string_at(body, "/properties/namespaceType") {
            attributes.insert("namespace_type".to_string(), Value::String(namespace_type));
        }
        if let Some(endpoint) = string_at(body, "/properties/serviceBusEndpoint") {
            attributes.insert("servicebus_endpoint".to_string(), Value::String(endpoint));
        }

        let tags = flatten_tags(body.get("tags"));
        if !tags.is_empty() {
            attributes.insert("tags".to_string(), Value::Map(tags));
        }
        attributes
    }
}
