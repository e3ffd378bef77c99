//! Per-operation deadlines for provider operations

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Default deadline for create, update and delete (30 minutes)
pub const DEFAULT_MUTATE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Default deadline for read (5 minutes)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Upper bound for deadlines, roughly 30 years out
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Instant `timeout` from now; longer timeouts are capped at [`FAR_FUTURE`]
pub fn deadline_after(timeout: Duration) -> Instant {
    Instant::now() + timeout.min(FAR_FUTURE)
}

/// Lifecycle operation a deadline applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Deadlines for each lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TimeoutsConfig", into = "TimeoutsConfig")]
pub struct OperationTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl OperationTimeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_MUTATE_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
            update: DEFAULT_MUTATE_TIMEOUT,
            delete: DEFAULT_MUTATE_TIMEOUT,
        }
    }
}

/// Serialized form, in whole seconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TimeoutsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delete_secs: Option<u64>,
}

impl From<TimeoutsConfig> for OperationTimeouts {
    fn from(config: TimeoutsConfig) -> Self {
        let defaults = OperationTimeouts::default();
        let or = |secs: Option<u64>, default: Duration| secs.map_or(default, Duration::from_secs);
        Self {
            create: or(config.create_secs, defaults.create),
            read: or(config.read_secs, defaults.read),
            update: or(config.update_secs, defaults.update),
            delete: or(config.delete_secs, defaults.delete),
        }
    }
}

impl From<OperationTimeouts> for TimeoutsConfig {
    fn from(timeouts: OperationTimeouts) -> Self {
        Self {
            create_secs: Some(timeouts.create.as_secs()),
            read_secs: Some(timeouts.read.as_secs()),
            update_secs: Some(timeouts.update.as_secs()),
            delete_secs: Some(timeouts.delete.as_secs()),
        }
    }
}
