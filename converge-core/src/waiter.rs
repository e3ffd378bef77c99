//! Waiter - Polling a remote resource until provisioning settles
//!
//! After a mutating API call, the remote resource usually needs time before
//! it reports the expected status. [`reconcile`] probes it at a fixed
//! cadence until the status lands in the policy's target set (enough times
//! in a row), leaves both the pending and target sets, the deadline passes,
//! or the operation is cancelled.
//!
//! A probe that reports "not found" counts as pending: a just-created
//! resource is often not visible yet. Every other probe error ends the wait
//! immediately and is not retried.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::cancel::CancelToken;
use crate::provider::BoxFuture;
use crate::timeouts::deadline_after;

/// Boxed error produced by a status probe
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Status reported by a single probe, compared only for set membership
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservedStatus(String);

impl ObservedStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Synthetic pending observation recorded when a probe reports not found
    pub fn not_found() -> Self {
        Self::new("not found")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObservedStatus {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObservedStatus {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u16> for ObservedStatus {
    fn from(code: u16) -> Self {
        Self(code.to_string())
    }
}

impl std::fmt::Display for ObservedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one status check
#[derive(Debug)]
pub enum ProbeResult {
    Observed(ObservedStatus),
    /// The resource is not visible (yet); treated as pending
    NotFound,
    Failed(BoxError),
}

/// Performs one status check against the remote system
pub trait StatusProbe: Send + Sync {
    fn probe<'a>(&'a self, identifier: &'a str) -> BoxFuture<'a, ProbeResult>;
}

/// Probe backed by a closure returning a future
pub struct ProbeFn<F>(F);

/// Wrap a closure as a [`StatusProbe`]
pub fn probe_fn<F, Fut>(f: F) -> ProbeFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    ProbeFn(f)
}

impl<F, Fut> StatusProbe for ProbeFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    fn probe<'a>(&'a self, identifier: &'a str) -> BoxFuture<'a, ProbeResult> {
        Box::pin((self.0)(identifier.to_string()))
    }
}

impl<F> std::fmt::Debug for ProbeFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProbeFn")
    }
}

/// Invalid poll policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("target statuses must not be empty")]
    EmptyTarget,

    #[error("status {0:?} is both pending and target")]
    Overlapping(String),

    #[error("required consecutive target hits must be at least 1")]
    ZeroHits,

    #[error("timeout must be positive")]
    ZeroTimeout,

    #[error("minimum poll interval must be positive")]
    ZeroInterval,
}

/// How to poll a resource while it settles
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PollPolicyConfig")]
pub struct PollPolicy {
    pending: HashSet<ObservedStatus>,
    target: HashSet<ObservedStatus>,
    min_interval: Duration,
    required_consecutive_target_hits: u32,
    timeout: Duration,
}

impl PollPolicy {
    /// Start a policy with the given pending and target statuses.
    ///
    /// Defaults: 10s interval, one target hit, 20 minute timeout.
    pub fn builder<P, T, S>(pending: P, target: T) -> PollPolicyBuilder
    where
        P: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: Into<ObservedStatus>,
    {
        PollPolicyBuilder {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            min_interval: Duration::from_secs(10),
            required_consecutive_target_hits: 1,
            timeout: Duration::from_secs(20 * 60),
        }
    }

    pub fn is_pending(&self, status: &ObservedStatus) -> bool {
        self.pending.contains(status)
    }

    pub fn is_target(&self, status: &ObservedStatus) -> bool {
        self.target.contains(status)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn required_consecutive_target_hits(&self) -> u32 {
        self.required_consecutive_target_hits
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Same policy with a different overall deadline
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self, PolicyError> {
        if timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        Ok(Self {
            timeout,
            ..self.clone()
        })
    }
}

/// Builder for [`PollPolicy`]; `build` checks the invariants
#[derive(Debug, Clone)]
pub struct PollPolicyBuilder {
    pending: HashSet<ObservedStatus>,
    target: HashSet<ObservedStatus>,
    min_interval: Duration,
    required_consecutive_target_hits: u32,
    timeout: Duration,
}

impl PollPolicyBuilder {
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn required_consecutive_target_hits(mut self, hits: u32) -> Self {
        self.required_consecutive_target_hits = hits;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<PollPolicy, PolicyError> {
        if self.target.is_empty() {
            return Err(PolicyError::EmptyTarget);
        }
        if let Some(status) = self.pending.intersection(&self.target).next() {
            return Err(PolicyError::Overlapping(status.to_string()));
        }
        if self.required_consecutive_target_hits == 0 {
            return Err(PolicyError::ZeroHits);
        }
        if self.timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        if self.min_interval.is_zero() {
            return Err(PolicyError::ZeroInterval);
        }
        Ok(PollPolicy {
            pending: self.pending,
            target: self.target,
            min_interval: self.min_interval,
            required_consecutive_target_hits: self.required_consecutive_target_hits,
            timeout: self.timeout,
        })
    }
}

/// Serialized form of [`PollPolicy`]
#[derive(Debug, Deserialize)]
struct PollPolicyConfig {
    #[serde(default)]
    pending: Vec<String>,
    target: Vec<String>,
    min_interval_ms: u64,
    timeout_secs: u64,
    #[serde(default = "default_hits")]
    required_consecutive_target_hits: u32,
}

fn default_hits() -> u32 {
    1
}

impl TryFrom<PollPolicyConfig> for PollPolicy {
    type Error = PolicyError;

    fn try_from(config: PollPolicyConfig) -> Result<Self, Self::Error> {
        PollPolicy::builder(config.pending, config.target)
            .min_interval(Duration::from_millis(config.min_interval_ms))
            .required_consecutive_target_hits(config.required_consecutive_target_hits)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
    }
}

/// Why a wait ended in failure
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("checking status of {identifier}: {source}")]
    Transport {
        identifier: String,
        #[source]
        source: BoxError,
    },

    #[error("unexpected status {status} for {identifier}")]
    UnexpectedStatus {
        identifier: String,
        status: ObservedStatus,
    },

    #[error("waiting for {identifier} was cancelled")]
    Cancelled { identifier: String },
}

/// Terminal result of a [`reconcile`] call
#[derive(Debug)]
pub enum ReconcileOutcome {
    Succeeded(ObservedStatus),
    /// The deadline passed while the resource was still pending
    TimedOut {
        last_observed: Option<ObservedStatus>,
        probes: usize,
    },
    Failed(FailureCause),
}

impl ReconcileOutcome {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, ReconcileOutcome::Succeeded(_))
    }

    /// Convert into a `Result`, for callers that surface failures as errors
    pub fn into_result(self, identifier: &str) -> Result<ObservedStatus, ReconcileError> {
        match self {
            ReconcileOutcome::Succeeded(status) => Ok(status),
            ReconcileOutcome::TimedOut {
                last_observed,
                probes,
            } => Err(ReconcileError::TimedOut {
                identifier: identifier.to_string(),
                last_observed: describe(last_observed.as_ref()),
                probes,
            }),
            ReconcileOutcome::Failed(cause) => Err(ReconcileError::Failed(cause)),
        }
    }
}

fn describe(status: Option<&ObservedStatus>) -> String {
    status.map_or_else(|| "none".to_string(), ToString::to_string)
}

/// A wait that did not succeed
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(
        "timed out waiting for {identifier} after {probes} probes (last observed status: {last_observed})"
    )]
    TimedOut {
        identifier: String,
        last_observed: String,
        probes: usize,
    },

    #[error(transparent)]
    Failed(#[from] FailureCause),
}

/// Poll `probe` for `identifier` until `policy` says the resource settled.
///
/// The deadline is computed once on entry and is not extended by slow
/// probes. Probes never overlap. Only the sleep between probes observes
/// `cancel`; an in-flight probe always runs to completion.
pub async fn reconcile<P>(
    identifier: &str,
    probe: &P,
    policy: &PollPolicy,
    cancel: &CancelToken,
) -> ReconcileOutcome
where
    P: StatusProbe + ?Sized,
{
    let deadline = deadline_after(policy.timeout);
    let mut consecutive_hits = 0u32;
    let mut probes = 0usize;
    let mut last_observed: Option<ObservedStatus> = None;

    loop {
        if Instant::now() >= deadline {
            log::warn!(
                "Timed out waiting for {} after {} probes (last observed: {})",
                identifier,
                probes,
                describe(last_observed.as_ref())
            );
            return ReconcileOutcome::TimedOut {
                last_observed,
                probes,
            };
        }
        if cancel.is_cancelled() {
            return cancelled(identifier);
        }

        probes += 1;
        let observed = match probe.probe(identifier).await {
            ProbeResult::Observed(status) => Some(status),
            ProbeResult::NotFound => None,
            ProbeResult::Failed(source) => {
                log::debug!("Status probe for {} failed: {}", identifier, source);
                return ReconcileOutcome::Failed(FailureCause::Transport {
                    identifier: identifier.to_string(),
                    source,
                });
            }
        };

        match observed {
            Some(status) if policy.is_target(&status) => {
                consecutive_hits += 1;
                log::trace!(
                    "{}: target status {} ({}/{})",
                    identifier,
                    status,
                    consecutive_hits,
                    policy.required_consecutive_target_hits
                );
                if consecutive_hits >= policy.required_consecutive_target_hits {
                    log::debug!("{} reached {} after {} probes", identifier, status, probes);
                    return ReconcileOutcome::Succeeded(status);
                }
                last_observed = Some(status);
            }
            Some(status) if policy.is_pending(&status) => {
                log::trace!("{}: pending status {}", identifier, status);
                consecutive_hits = 0;
                last_observed = Some(status);
            }
            None => {
                log::trace!("{}: not found yet", identifier);
                consecutive_hits = 0;
                last_observed = Some(ObservedStatus::not_found());
            }
            Some(status) => {
                log::debug!("{}: unexpected status {}", identifier, status);
                return ReconcileOutcome::Failed(FailureCause::UnexpectedStatus {
                    identifier: identifier.to_string(),
                    status,
                });
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let delay = policy.min_interval.min(remaining);
        if sleep_or_cancel(delay, cancel).await {
            return cancelled(identifier);
        }
    }
}

/// Sleep for `delay`; returns true if cancelled first
async fn sleep_or_cancel(delay: Duration, cancel: &CancelToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(delay) => false,
    }
}

fn cancelled(identifier: &str) -> ReconcileOutcome {
    log::debug!("Waiting for {} was cancelled", identifier);
    ReconcileOutcome::Failed(FailureCause::Cancelled {
        identifier: identifier.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Probe that replays a script and repeats its last entry forever
    struct ScriptedProbe {
        script: Mutex<VecDeque<&'static str>>,
        last: &'static str,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(script: &[&'static str]) -> Self {
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                last: script.last().copied().unwrap_or("404"),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StatusProbe for ScriptedProbe {
        fn probe<'a>(&'a self, _identifier: &'a str) -> BoxFuture<'a, ProbeResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.last);
            Box::pin(async move {
                match next {
                    "not-found" => ProbeResult::NotFound,
                    "error" => ProbeResult::Failed("connection reset".into()),
                    status => ProbeResult::Observed(status.into()),
                }
            })
        }
    }

    fn policy(hits: u32) -> PollPolicy {
        PollPolicy::builder(["404"], ["200"])
            .min_interval(Duration::from_millis(10))
            .required_consecutive_target_hits(hits)
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_pending_observations() {
        let probe = ScriptedProbe::new(&["404", "404", "200"]);
        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;

        match outcome {
            ReconcileOutcome::Succeeded(status) => assert_eq!(status.as_str(), "200"),
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn always_pending_times_out_near_deadline() {
        let _ = env_logger::builder().is_test(true).try_init();
        let probe = ScriptedProbe::new(&["404"]);
        let start = Instant::now();
        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;
        let elapsed = start.elapsed();

        match outcome {
            ReconcileOutcome::TimedOut {
                last_observed,
                probes,
            } => {
                assert_eq!(last_observed, Some("404".into()));
                assert_eq!(probes, probe.calls());
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!((9..=11).contains(&probe.calls()), "{} probes", probe.calls());
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed <= Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_pending_until_timeout() {
        let probe = ScriptedProbe::new(&["not-found"]);
        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;
        match outcome {
            ReconcileOutcome::TimedOut { last_observed, .. } => {
                assert_eq!(last_observed, Some(ObservedStatus::not_found()));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_then_target_succeeds() {
        let probe = ScriptedProbe::new(&["not-found", "not-found", "200"]);
        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;
        assert!(outcome.is_succeeded());
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_between_hits_resets_counter() {
        let probe = ScriptedProbe::new(&["200", "404", "200", "200"]);
        let outcome = reconcile("ns-1", &probe, &policy(2), &CancelToken::never()).await;
        assert!(outcome.is_succeeded());
        assert_eq!(probe.calls(), 4);

        // With three hits required the reset means a fifth probe is needed
        let probe = ScriptedProbe::new(&["200", "404", "200", "200", "200"]);
        let outcome = reconcile("ns-1", &probe, &policy(3), &CancelToken::never()).await;
        assert!(outcome.is_succeeded());
        assert_eq!(probe.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_between_hits_resets_counter() {
        let probe = ScriptedProbe::new(&["200", "not-found", "200", "404"]);
        let outcome = reconcile("ns-1", &probe, &policy(2), &CancelToken::never()).await;
        assert!(matches!(outcome, ReconcileOutcome::TimedOut { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_status_fails_immediately() {
        let probe = ScriptedProbe::new(&["500", "200"]);
        let start = Instant::now();
        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;

        match outcome {
            ReconcileOutcome::Failed(FailureCause::UnexpectedStatus { identifier, status }) => {
                assert_eq!(identifier, "ns-1");
                assert_eq!(status.as_str(), "500");
            }
            other => panic!("expected unexpected status, got {:?}", other),
        }
        assert_eq!(probe.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_fails_without_further_probes() {
        let probe = ScriptedProbe::new(&["404", "error", "200"]);
        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;

        match outcome {
            ReconcileOutcome::Failed(cause @ FailureCause::Transport { .. }) => {
                assert_eq!(
                    cause.to_string(),
                    "checking status of ns-1: connection reset"
                );
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_sleep_returns_promptly() {
        let probe = Arc::new(ScriptedProbe::new(&["404"]));
        let policy = PollPolicy::builder(["404"], ["200"])
            .min_interval(Duration::from_secs(60))
            .timeout(Duration::from_secs(3600))
            .build()
            .unwrap();
        let (handle, token) = cancel_pair();

        let task = {
            let probe = Arc::clone(&probe);
            tokio::spawn(async move { reconcile("ns-1", probe.as_ref(), &policy, &token).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        let cancelled_at = Instant::now();
        handle.cancel();
        let outcome = task.await.unwrap();

        assert!(matches!(
            outcome,
            ReconcileOutcome::Failed(FailureCause::Cancelled { .. })
        ));
        assert!(cancelled_at.elapsed() < Duration::from_secs(1));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_does_not_probe() {
        let probe = ScriptedProbe::new(&["200"]);
        let (handle, token) = cancel_pair();
        handle.cancel();

        let outcome = reconcile("ns-1", &probe, &policy(1), &token).await;
        assert!(matches!(
            outcome,
            ReconcileOutcome::Failed(FailureCause::Cancelled { .. })
        ));
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_probe_does_not_extend_deadline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = {
            let calls = Arc::clone(&calls);
            probe_fn(move |_id| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    ProbeResult::Observed("404".into())
                }
            })
        };

        let outcome = reconcile("ns-1", &probe, &policy(1), &CancelToken::never()).await;
        assert!(matches!(outcome, ReconcileOutcome::TimedOut { probes: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_fn_receives_identifier() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = {
            let seen = Arc::clone(&seen);
            probe_fn(move |id| {
                seen.lock().unwrap().push(id);
                async { ProbeResult::Observed(200u16.into()) }
            })
        };

        let outcome = reconcile("/subscriptions/x", &probe, &policy(1), &CancelToken::never()).await;
        assert!(outcome.is_succeeded());
        assert_eq!(*seen.lock().unwrap(), vec!["/subscriptions/x".to_string()]);
    }

    #[test]
    fn into_result_embeds_identifier_and_last_status() {
        let outcome = ReconcileOutcome::TimedOut {
            last_observed: Some("404".into()),
            probes: 7,
        };
        let err = outcome.into_result("ns-1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "timed out waiting for ns-1 after 7 probes (last observed status: 404)"
        );

        let outcome = ReconcileOutcome::Failed(FailureCause::UnexpectedStatus {
            identifier: "ns-1".to_string(),
            status: "409".into(),
        });
        let err = outcome.into_result("ns-1").unwrap_err();
        assert_eq!(err.to_string(), "unexpected status 409 for ns-1");
    }

    #[test]
    fn builder_rejects_invalid_policies() {
        let overlap = PollPolicy::builder(["200", "404"], ["200"]).build();
        assert_eq!(overlap, Err(PolicyError::Overlapping("200".to_string())));

        let empty: [&str; 0] = [];
        assert_eq!(
            PollPolicy::builder(["404"], empty).build(),
            Err(PolicyError::EmptyTarget)
        );
        assert_eq!(
            PollPolicy::builder(["404"], ["200"])
                .required_consecutive_target_hits(0)
                .build(),
            Err(PolicyError::ZeroHits)
        );
        assert_eq!(
            PollPolicy::builder(["404"], ["200"])
                .timeout(Duration::ZERO)
                .build(),
            Err(PolicyError::ZeroTimeout)
        );
        assert_eq!(
            PollPolicy::builder(["404"], ["200"])
                .min_interval(Duration::ZERO)
                .build(),
            Err(PolicyError::ZeroInterval)
        );
        assert_eq!(
            policy(1).with_timeout(Duration::ZERO),
            Err(PolicyError::ZeroTimeout)
        );
    }

    #[test]
    fn policy_from_config() {
        let policy: PollPolicy = serde_json::from_str(
            r#"{
                "pending": ["404"],
                "target": ["200"],
                "min_interval_ms": 15000,
                "timeout_secs": 1800,
                "required_consecutive_target_hits": 10
            }"#,
        )
        .unwrap();

        assert!(policy.is_pending(&"404".into()));
        assert!(policy.is_target(&"200".into()));
        assert!(!policy.is_target(&"404".into()));
        assert_eq!(policy.min_interval(), Duration::from_secs(15));
        assert_eq!(policy.timeout(), Duration::from_secs(1800));
        assert_eq!(policy.required_consecutive_target_hits(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn largest_configured_timeout_still_polls() {
        let policy: PollPolicy = serde_json::from_str(
            r#"{"pending": ["404"], "target": ["200"], "min_interval_ms": 10, "timeout_secs": 18446744073709551615}"#,
        )
        .unwrap();
        assert_eq!(policy.timeout(), Duration::from_secs(u64::MAX));

        let probe = ScriptedProbe::new(&["404", "200"]);
        let start = Instant::now();
        let outcome = reconcile("ns-1", &probe, &policy, &CancelToken::never()).await;

        assert!(outcome.is_succeeded(), "{:?}", outcome);
        assert_eq!(probe.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(10));
    }

    #[test]
    fn policy_config_is_validated() {
        let result: Result<PollPolicy, _> = serde_json::from_str(
            r#"{"pending": ["200"], "target": ["200"], "min_interval_ms": 10, "timeout_secs": 1}"#,
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("both pending and target"));
    }
}
