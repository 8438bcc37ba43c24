//! Engine controller trait definition.
//!
//! This port is the shared behavioral contract of every local engine
//! adapter: one child process, one model, one bound host/port.
//! Implementations handle all process lifecycle details internally.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{EngineKind, ServerStatus};

/// Failures of a single engine lifecycle transition.
///
/// At the controller boundary these become `false` plus a log entry;
/// the typed form is kept for callers that want to report a reason.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine executable could not be located. Never retried.
    #[error("{engine} executable '{binary}' not found. {hint}")]
    BinaryNotFound {
        engine: EngineKind,
        binary: String,
        /// Remediation shown to the user (install command).
        hint: &'static str,
    },

    /// The OS refused to spawn the process for another reason.
    #[error("Failed to spawn {engine}: {reason}")]
    SpawnFailed { engine: EngineKind, reason: String },

    /// The engine never answered its readiness probe within the budget.
    #[error("{engine} did not become ready within {waited_secs}s")]
    StartupTimeout { engine: EngineKind, waited_secs: u64 },

    /// The child exited before becoming ready.
    #[error("{engine} exited before becoming ready ({status})")]
    ProcessCrashed {
        engine: EngineKind,
        /// Exit status description, e.g. `exit status: 1`.
        status: String,
        /// Last lines the engine wrote to stderr.
        stderr_tail: Vec<String>,
    },

    /// Connection refused or timed out while probing. Means "not ready yet".
    #[error("Readiness probe failed: {0}")]
    HealthCheckTransport(String),

    /// The transition task ended without producing a result.
    #[error("{engine} transition interrupted: {reason}")]
    Interrupted { engine: EngineKind, reason: String },
}

impl EngineError {
    /// Engine the error belongs to, if it names one.
    #[must_use]
    pub const fn engine(&self) -> Option<EngineKind> {
        match self {
            Self::BinaryNotFound { engine, .. }
            | Self::SpawnFailed { engine, .. }
            | Self::StartupTimeout { engine, .. }
            | Self::ProcessCrashed { engine, .. }
            | Self::Interrupted { engine, .. } => Some(*engine),
            Self::HealthCheckTransport(_) => None,
        }
    }
}

/// Lifecycle controller for one local inference engine.
///
/// # Design Rules
///
/// - Liveness is always re-derived from the OS process handle
/// - `start`/`stop`/`restart` are serialized per controller
/// - Every failure is reported as `false` plus a log entry; nothing here
///   returns an error to the caller
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait EngineController: Send + Sync {
    /// Which engine this controller runs.
    fn kind(&self) -> EngineKind;

    /// True iff a process handle exists and the OS reports it alive.
    fn is_running(&self) -> bool;

    /// One readiness probe against `GET /v1/models`. Never fails.
    async fn health_check(&self) -> bool;

    /// Start serving `model_id`, waiting at most `max_wait` (the
    /// controller's startup timeout when `None`) for readiness.
    ///
    /// Returns `true` without spawning when `model_id` is already running.
    async fn start(&self, model_id: &str, max_wait: Option<Duration>) -> bool;

    /// Stop the process if there is one. Idempotent.
    async fn stop(&self);

    /// `stop()` followed by `start(model_id)`, as one serialized transition.
    async fn restart(&self, model_id: &str) -> bool;

    /// Current snapshot.
    fn status(&self) -> ServerStatus;
}
