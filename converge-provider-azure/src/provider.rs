//! Azure provider implementation
//!
//! This module contains the lifecycle operations shared by every Azure
//! resource type. Each resource type plugs in through [`ArmResource`], which
//! only knows how to build request bodies and flatten responses; existence
//! checks, deadlines and waiting for replication live here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use converge_core::cancel::CancelToken;
use converge_core::provider::{BoxFuture, ProviderError, ProviderResult, ResourceSchema};
use converge_core::resource::{Resource, ResourceId, State, Value};
use converge_core::timeouts::{Operation, OperationTimeouts, deadline_after};
use converge_core::waiter::{PollPolicy, ProbeResult, StatusProbe, reconcile};
use serde::Deserialize;
use tokio::time::Instant;

use crate::client::{ApiError, ManagementClient};
use crate::ids::AzureResourceId;
use crate::resources::ResourceConfig;
use crate::validation::ValidationResult;

/// Provider configuration supplied by the host
#[derive(Debug, Clone, Deserialize)]
pub struct AzureProviderConfig {
    pub subscription_id: String,
    #[serde(default)]
    pub timeouts: OperationTimeouts,
}

impl AzureProviderConfig {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            timeouts: OperationTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: OperationTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Mapping between declared attributes and one ARM resource type
pub trait ArmResource: Send + Sync {
    fn config(&self) -> ResourceConfig;

    fn schema(&self) -> ResourceSchema;

    /// Type-specific checks beyond the schema
    fn validate(&self, _resource: &Resource) -> ValidationResult {
        Ok(())
    }

    /// Fill in defaults and normalize values as the API reports them back
    fn normalize(&self, _attributes: &mut HashMap<String, Value>) {}

    /// Request body for create
    fn expand(&self, resource: &Resource) -> serde_json::Value;

    /// Request body for an in-place update
    fn expand_patch(&self, from: &State, to: &Resource) -> serde_json::Value;

    /// Attributes read back from a GET response
    fn flatten(&self, id: &AzureResourceId, body: &serde_json::Value) -> HashMap<String, Value>;

    /// Whether delete waits until the resource is gone
    fn wait_for_deletion(&self) -> bool {
        false
    }
}

/// Azure Resource Manager provider
pub struct AzureProvider {
    client: Arc<dyn ManagementClient>,
    config: AzureProviderConfig,
    cancel: CancelToken,
}

impl AzureProvider {
    pub fn new(client: Arc<dyn ManagementClient>, config: AzureProviderConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancelToken::never(),
        }
    }

    /// Stop waiting for resources to settle once `cancel` fires
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Create a resource and wait until it is consistently visible
    pub async fn create_resource(
        &self,
        adapter: &dyn ArmResource,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let deadline = self.deadline(Operation::Create);
        let config = adapter.config();

        let mut resource = resource.clone();
        adapter.normalize(&mut resource.attributes);
        validate(adapter, &resource)?;

        let id = self.resource_id_for(&config, &resource)?;
        let identifier = id.to_string();

        self.ensure_absent(&config, &identifier, deadline)
            .await
            .map_err(|e| e.for_resource(resource.id.clone()))?;

        let body = adapter.expand(&resource);
        self.call(
            Operation::Create,
            deadline,
            self.client.put(&identifier, config.api_version, body),
        )
        .await
        .map_err(|e| {
            ProviderError::new(format!("creating {}", identifier))
                .with_cause(e)
                .for_resource(resource.id.clone())
        })?;

        log::debug!("Waiting for {} to be created..", identifier);
        let policy = self.settle_policy(&config, Operation::Create, deadline)?;
        let probe = ArmProbe::new(self.client.as_ref(), config.api_version);
        reconcile(&identifier, &probe, &policy, &self.cancel)
            .await
            .into_result(&identifier)
            .map_err(|e| {
                ProviderError::new(format!("waiting for {} to finish replicating", identifier))
                    .with_cause(e)
                    .for_resource(resource.id.clone())
            })?;

        self.read_with_deadline(
            adapter,
            &resource.id,
            &identifier,
            Operation::Create,
            deadline,
        )
        .await
    }

    /// Read a resource; a missing resource yields `State::not_found`
    pub async fn read_resource(
        &self,
        adapter: &dyn ArmResource,
        resource_id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let identifier = match identifier {
            Some(identifier) => identifier,
            None => return Ok(State::not_found(resource_id.clone())),
        };

        let deadline = self.deadline(Operation::Read);
        self.read_with_deadline(adapter, resource_id, identifier, Operation::Read, deadline)
            .await
    }

    /// Read back within the deadline of the operation that needs the state
    async fn read_with_deadline(
        &self,
        adapter: &dyn ArmResource,
        resource_id: &ResourceId,
        identifier: &str,
        operation: Operation,
        deadline: Instant,
    ) -> ProviderResult<State> {
        let config = adapter.config();
        let id = AzureResourceId::parse(config.arm_type, identifier).map_err(|e| {
            ProviderError::new(e.to_string())
                .with_cause(e)
                .for_resource(resource_id.clone())
        })?;

        let result = self
            .call(
                operation,
                deadline,
                self.client.get(identifier, config.api_version),
            )
            .await;

        let response = match result {
            Ok(response) => response,
            Err(CallError::Api(e)) if e.was_not_found() => {
                log::debug!("{} was not found - removing from state!", identifier);
                return Ok(State::not_found(resource_id.clone()));
            }
            Err(e) => {
                return Err(ProviderError::new(format!("retrieving {}", identifier))
                    .with_cause(e)
                    .for_resource(resource_id.clone()));
            }
        };

        let attributes = adapter.flatten(&id, &response.body);
        Ok(State::existing(resource_id.clone(), attributes).with_identifier(identifier))
    }

    /// Update a resource in place; force-new changes are rejected
    pub async fn update_resource(
        &self,
        adapter: &dyn ArmResource,
        resource_id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let deadline = self.deadline(Operation::Update);
        let config = adapter.config();

        let mut to = to.clone();
        adapter.normalize(&mut to.attributes);
        validate(adapter, &to)?;

        let replace = adapter.schema().replacement_attributes(from, &to);
        if !replace.is_empty() {
            return Err(ProviderError::new(format!(
                "changing {} requires replacing {}, delete and recreate",
                replace.join(", "),
                resource_id.resource_type
            ))
            .for_resource(resource_id.clone()));
        }

        AzureResourceId::parse(config.arm_type, identifier).map_err(|e| {
            ProviderError::new(e.to_string())
                .with_cause(e)
                .for_resource(resource_id.clone())
        })?;

        let body = adapter.expand_patch(from, &to);
        self.call(
            Operation::Update,
            deadline,
            self.client.patch(identifier, config.api_version, body),
        )
        .await
        .map_err(|e| {
            ProviderError::new(format!("updating {}", identifier))
                .with_cause(e)
                .for_resource(resource_id.clone())
        })?;

        self.read_with_deadline(
            adapter,
            resource_id,
            identifier,
            Operation::Update,
            deadline,
        )
        .await
    }

    /// Delete a resource; an already missing resource is not an error
    pub async fn delete_resource(
        &self,
        adapter: &dyn ArmResource,
        resource_id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        let deadline = self.deadline(Operation::Delete);
        let config = adapter.config();

        AzureResourceId::parse(config.arm_type, identifier).map_err(|e| {
            ProviderError::new(e.to_string())
                .with_cause(e)
                .for_resource(resource_id.clone())
        })?;

        match self
            .call(
                Operation::Delete,
                deadline,
                self.client.delete(identifier, config.api_version),
            )
            .await
        {
            Ok(_) => {}
            Err(CallError::Api(e)) if e.was_not_found() => return Ok(()),
            Err(e) => {
                return Err(ProviderError::new(format!("deleting {}", identifier))
                    .with_cause(e)
                    .for_resource(resource_id.clone()));
            }
        }

        if !adapter.wait_for_deletion() {
            return Ok(());
        }

        log::debug!("Waiting for {} to be deleted..", identifier);
        let remaining = remaining(Operation::Delete, deadline)?;
        let policy = PollPolicy::builder(["200", "202"], ["404"])
            .min_interval(config.settle.min_interval)
            .timeout(remaining)
            .build()
            .map_err(|e| ProviderError::new(e.to_string()).with_cause(e))?;
        let probe = ArmProbe::new(self.client.as_ref(), config.api_version).reporting_not_found();
        reconcile(identifier, &probe, &policy, &self.cancel)
            .await
            .into_result(identifier)
            .map_err(|e| {
                ProviderError::new(format!("waiting for {} to be deleted", identifier))
                    .with_cause(e)
                    .for_resource(resource_id.clone())
            })?;

        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn deadline(&self, operation: Operation) -> Instant {
        deadline_after(self.config.timeouts.for_operation(operation))
    }

    fn resource_id_for(
        &self,
        config: &ResourceConfig,
        resource: &Resource,
    ) -> ProviderResult<AzureResourceId> {
        let name = resource.get_str("name").unwrap_or_default();
        let resource_group = resource.get_str("resource_group_name").unwrap_or_default();
        if name.is_empty() || resource_group.is_empty() {
            return Err(
                ProviderError::new("name and resource_group_name must not be empty")
                    .for_resource(resource.id.clone()),
            );
        }
        Ok(AzureResourceId::new(
            config.arm_type,
            &self.config.subscription_id,
            resource_group,
            name,
        ))
    }

    /// Fail if the resource already exists; it has to be imported instead
    async fn ensure_absent(
        &self,
        config: &ResourceConfig,
        identifier: &str,
        deadline: Instant,
    ) -> ProviderResult<()> {
        match self
            .call(
                Operation::Create,
                deadline,
                self.client.get(identifier, config.api_version),
            )
            .await
        {
            Ok(_) => Err(ProviderError::new(format!(
                "a resource with the ID {:?} already exists - to be managed it needs to be imported into the state",
                identifier
            ))),
            Err(CallError::Api(e)) if e.was_not_found() => Ok(()),
            Err(e) => Err(ProviderError::new(format!(
                "checking for presence of existing {}",
                identifier
            ))
            .with_cause(e)),
        }
    }

    fn settle_policy(
        &self,
        config: &ResourceConfig,
        operation: Operation,
        deadline: Instant,
    ) -> ProviderResult<PollPolicy> {
        PollPolicy::builder(["404"], ["200"])
            .min_interval(config.settle.min_interval)
            .required_consecutive_target_hits(config.settle.required_consecutive_target_hits)
            .timeout(remaining(operation, deadline)?)
            .build()
            .map_err(|e| ProviderError::new(e.to_string()).with_cause(e))
    }

    /// Run one API call bounded by the operation deadline
    async fn call<T>(
        &self,
        operation: Operation,
        deadline: Instant,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, CallError> {
        match tokio::time::timeout_at(deadline, request).await {
            Ok(result) => result.map_err(CallError::Api),
            Err(_) => Err(CallError::DeadlineExceeded(operation)),
        }
    }
}

fn validate(adapter: &dyn ArmResource, resource: &Resource) -> ProviderResult<()> {
    let result = crate::validation::collect([
        crate::validation::validate_resource(&adapter.schema(), resource),
        adapter.validate(resource),
    ]);
    result.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        ProviderError::new(format!("invalid configuration: {}", messages.join("; ")))
            .for_resource(resource.id.clone())
    })
}

fn remaining(operation: Operation, deadline: Instant) -> ProviderResult<std::time::Duration> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(ProviderError::new(format!(
            "{} deadline exceeded",
            operation
        )));
    }
    Ok(remaining)
}

/// Failure of a single API call made by the provider
#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error(transparent)]
    Api(ApiError),

    #[error("{0} deadline exceeded")]
    DeadlineExceeded(Operation),
}

/// Status probe issuing a GET against the resource ID
struct ArmProbe<'a> {
    client: &'a dyn ManagementClient,
    api_version: &'static str,
    /// Report 404 as an observed status instead of "not found (yet)"
    report_not_found: bool,
}

impl<'a> ArmProbe<'a> {
    fn new(client: &'a dyn ManagementClient, api_version: &'static str) -> Self {
        Self {
            client,
            api_version,
            report_not_found: false,
        }
    }

    fn reporting_not_found(mut self) -> Self {
        self.report_not_found = true;
        self
    }
}

impl StatusProbe for ArmProbe<'_> {
    fn probe<'b>(&'b self, identifier: &'b str) -> BoxFuture<'b, ProbeResult> {
        Box::pin(async move {
            match self.client.get(identifier, self.api_version).await {
                Ok(response) => ProbeResult::Observed(response.status.into()),
                Err(e) if e.was_not_found() && self.report_not_found => {
                    ProbeResult::Observed(404u16.into())
                }
                Err(e) if e.was_not_found() => ProbeResult::NotFound,
                Err(e) => ProbeResult::Failed(Box::new(e)),
            }
        })
    }
}
