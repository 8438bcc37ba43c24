//! Status snapshots reported to callers and dashboards.

use serde::{Deserialize, Serialize};

use super::EngineKind;

/// Lifecycle phase of one engine adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerPhase {
    #[default]
    Stopped,
    /// Process spawned, readiness probe not yet answered.
    Starting,
    Running,
    /// Termination signal sent, waiting for exit.
    Stopping,
}

/// Side-effect-free snapshot of one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub engine: EngineKind,
    /// Process handle present and the OS reports it alive.
    pub running: bool,
    pub phase: ServerPhase,
    pub model_id: Option<String>,
    pub host: String,
    pub port: u16,
    /// `http://{host}:{port}/v1` while running, `None` otherwise.
    pub url: Option<String>,
    pub pid: Option<u32>,
    /// Unix timestamp (seconds) of the last spawn.
    pub started_at: Option<i64>,
    /// Last line the engine wrote to stderr before a failed start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ServerStatus {
    /// Snapshot of an adapter with no process.
    pub fn stopped(engine: EngineKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            engine,
            running: false,
            phase: ServerPhase::Stopped,
            model_id: None,
            host: host.into(),
            port,
            url: None,
            pid: None,
            started_at: None,
            last_error: None,
        }
    }

    /// OpenAI-compatible base URL for an engine bound to `host:port`.
    pub fn base_url(host: &str, port: u16) -> String {
        format!("http://{host}:{port}/v1")
    }
}

/// Aggregate snapshot of every local engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub mlx: ServerStatus,
    pub vllm: ServerStatus,
}

impl ManagerStatus {
    /// Status of one engine.
    #[must_use]
    pub const fn engine(&self, kind: EngineKind) -> &ServerStatus {
        match kind {
            EngineKind::Mlx => &self.mlx,
            EngineKind::Vllm => &self.vllm,
        }
    }

    /// True when any local engine has a live process.
    #[must_use]
    pub const fn any_running(&self) -> bool {
        self.mlx.running || self.vllm.running
    }
}
