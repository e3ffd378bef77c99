//! Converge Azure Provider
//!
//! Azure Resource Manager provider implementation.
//!
//! ## Module Structure
//!
//! - `client` - Management API seam injected by the host
//! - `ids` - ARM resource ID parsing and formatting
//! - `provider` - AzureProvider and the shared lifecycle operations
//! - `resources` - Resource type definitions and configurations
//! - `notification_hub` / `api_center` - Per-resource attribute mapping
//! - `validation` - Attribute validation
//! - `utils` - Helper functions for value normalization

pub mod api_center;
pub mod client;
pub mod ids;
pub mod notification_hub;
pub mod provider;
pub mod resources;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export main types
pub use client::{ApiError, ApiResponse, ApiResult, ManagementClient};
pub use ids::{AzureResourceId, IdParseError};
pub use provider::{ArmResource, AzureProvider, AzureProviderConfig};

use converge_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult};
use converge_core::resource::{Resource, ResourceId, State};

use api_center::ApiCenterService;
use notification_hub::NotificationHubNamespace;
use resources::{API_CENTER_SERVICE, NOTIFICATION_HUB_NAMESPACE, resource_types};

/// Adapter for a resource type name
pub fn adapter_for(resource_type: &str) -> Option<&'static dyn ArmResource> {
    match resource_type {
        NOTIFICATION_HUB_NAMESPACE => Some(&NotificationHubNamespace),
        API_CENTER_SERVICE => Some(&ApiCenterService),
        _ => None,
    }
}

fn lookup(id: &ResourceId) -> ProviderResult<&'static dyn ArmResource> {
    adapter_for(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    })
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn resource_types(&self) -> Vec<Box<dyn converge_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            let adapter = lookup(&id)?;
            self.read_resource(adapter, &id, identifier.as_deref())
                .await
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let adapter = lookup(&resource.id)?;
            self.create_resource(adapter, &resource).await
        })
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
        Box::pin(async move {
            let adapter = lookup(&id)?;
            self.update_resource(adapter, &id, &identifier, &from, &to)
                .await
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let adapter = lookup(&id)?;
            self.delete_resource(adapter, &id, &identifier).await
        })
    }
}
