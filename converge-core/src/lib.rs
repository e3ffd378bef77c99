//! Converge Core
//!
//! Core library for declarative cloud resource providers: the resource
//! model, the provider trait, and the waiter that blocks a lifecycle
//! operation until the remote resource has settled.

pub mod cancel;
pub mod provider;
pub mod resource;
pub mod timeouts;
pub mod waiter;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use timeouts::{Operation, OperationTimeouts, deadline_after};
pub use waiter::{
    FailureCause, ObservedStatus, PollPolicy, ProbeResult, ReconcileError, ReconcileOutcome,
    StatusProbe, probe_fn, reconcile,
};
