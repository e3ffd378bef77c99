//! Resource type definitions for the Azure provider
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - ARM type, API version and settle policy for each resource type

use std::time::Duration;

use converge_core::provider::{AttributeSchema, ResourceSchema, ResourceType};

use crate::ids::ArmType;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $attributes:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                ResourceSchema::new($attributes)
            }
        }
    };
}

pub const NOTIFICATION_HUB_NAMESPACE: &str = "notification_hub_namespace";
pub const API_CENTER_SERVICE: &str = "api_center_service";

const NOTIFICATION_HUB_NAMESPACE_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::required("name").force_new(),
    AttributeSchema::required("resource_group_name").force_new(),
    AttributeSchema::required("location").force_new(),
    AttributeSchema::required("sku_name"),
    AttributeSchema::optional("enabled").force_new(),
    AttributeSchema::required("namespace_type").force_new(),
    AttributeSchema::optional("tags"),
    AttributeSchema::computed("servicebus_endpoint"),
];

const API_CENTER_SERVICE_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::required("name").force_new(),
    AttributeSchema::required("resource_group_name").force_new(),
    AttributeSchema::required("location").force_new(),
    AttributeSchema::optional("tags"),
];

define_resource_type!(
    NotificationHubNamespaceType,
    NOTIFICATION_HUB_NAMESPACE,
    NOTIFICATION_HUB_NAMESPACE_ATTRIBUTES
);
define_resource_type!(
    ApiCenterServiceType,
    API_CENTER_SERVICE,
    API_CENTER_SERVICE_ATTRIBUTES
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(NotificationHubNamespaceType), Box::new(ApiCenterServiceType)]
}

// =============================================================================
// Resource Configuration
// =============================================================================

/// How to wait for a resource after it was created
#[derive(Debug, Clone, Copy)]
pub struct SettleConfig {
    pub min_interval: Duration,
    pub required_consecutive_target_hits: u32,
}

/// Resource type configuration
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig {
    pub arm_type: ArmType,
    pub api_version: &'static str,
    pub settle: SettleConfig,
}

/// Namespaces replicate slowly; the first 200 is often followed by a 404
pub const NOTIFICATION_HUB_NAMESPACE_CONFIG: ResourceConfig = ResourceConfig {
    arm_type: ArmType {
        namespace: "Microsoft.NotificationHubs",
        type_segment: "namespaces",
    },
    api_version: "2023-09-01",
    settle: SettleConfig {
        min_interval: Duration::from_secs(15),
        required_consecutive_target_hits: 10,
    },
};

pub const API_CENTER_SERVICE_CONFIG: ResourceConfig = ResourceConfig {
    arm_type: ArmType {
        namespace: "Microsoft.ApiCenter",
        type_segment: "services",
    },
    api_version: "2024-03-01",
    settle: SettleConfig {
        min_interval: Duration::from_secs(5),
        required_consecutive_target_hits: 1,
    },
};

pub const NAMESPACE_SKUS: &[&str] = &["Basic", "Free", "Standard"];
pub const NAMESPACE_TYPES: &[&str] = &["Messaging", "NotificationHub"];
