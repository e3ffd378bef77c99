//! api_center_service resource

use std::collections::HashMap;

use converge_core::provider::{ResourceSchema, ResourceType};
use converge_core::resource::{Resource, State, Value};
use serde_json::json;

use crate::ids::AzureResourceId;
use crate::provider::ArmResource;
use crate::resources::{API_CENTER_SERVICE_CONFIG, ApiCenterServiceType, ResourceConfig};
use crate::utils::{expand_tags, flatten_tags, normalize_location, string_at};

pub struct ApiCenterService;

impl ArmResource for ApiCenterService {
    fn config(&self) -> ResourceConfig {
        API_CENTER_SERVICE_CONFIG
    }

    fn schema(&self) -> ResourceSchema {
        ApiCenterServiceType.schema()
    }

    fn normalize(&self, attributes: &mut HashMap<String, Value>) {
        if let Some(Value::String(location)) = attributes.get_mut("location") {
            *location = normalize_location(location);
        }
    }

    fn expand(&self, resource: &Resource) -> serde_json::Value {
        json!({
            "location": resource.get_str("location").map(normalize_location),
            "properties": {},
            "tags": expand_tags(resource.attributes.get("tags")),
        })
    }

    /// Only tags can change in place
    fn expand_patch(&self, _from: &State, to: &Resource) -> serde_json::Value {
        json!({ "tags": expand_tags(to.attributes.get("tags")) })
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
        let tags = flatten_tags(body.get("tags"));
        if !tags.is_empty() {
            attributes.insert("tags".to_string(), Value::Map(tags));
        }
        attributes
    }

    fn wait_for_deletion(&self) -> bool {
        true
    }
}
