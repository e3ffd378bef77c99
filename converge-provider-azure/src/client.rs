//! Azure Resource Manager client seam
//!
//! The provider never builds HTTP clients or handles credentials itself; the
//! host injects an implementation of [`ManagementClient`].

use async_trait::async_trait;
use thiserror::Error;

/// Response from the management API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }
}

/// Errors returned by the management API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// No response was received
    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// HTTP status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }

    pub fn was_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Azure Resource Manager operations used by the resource adapters
///
/// `resource_id` is a full ARM ID such as
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ApiCenter/services/{name}`.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    async fn get(&self, resource_id: &str, api_version: &str) -> ApiResult<ApiResponse>;

    /// Create or replace a resource
    async fn put(
        &self,
        resource_id: &str,
        api_version: &str,
        body: serde_json::Value,
    ) -> ApiResult<ApiResponse>;

    async fn patch(
        &self,
        resource_id: &str,
        api_version: &str,
        body: serde_json::Value,
    ) -> ApiResult<ApiResponse>;

    async fn delete(&self, resource_id: &str, api_version: &str) -> ApiResult<ApiResponse>;
}
