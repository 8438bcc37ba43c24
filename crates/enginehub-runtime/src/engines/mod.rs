//! Engine adapters.
//!
//! An adapter is a [`ServerController`] parameterized by an
//! [`EngineBackend`]. The backend only decides how the engine is invoked;
//! spawning, probing, crash detection and shutdown are shared.

mod mlx;
mod vllm;

use async_trait::async_trait;
use enginehub_core::{AcceleratorProbe, EngineKind, EngineSettings};
use std::sync::Arc;

use crate::controller::{ControllerConfig, ServerController};
use crate::process::EngineCommand;

pub use mlx::MlxBackend;
pub use vllm::VllmBackend;

/// MLX engine adapter.
pub type MlxController = ServerController<MlxBackend>;

/// vLLM engine adapter.
pub type VllmController = ServerController<VllmBackend>;

impl MlxController {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(MlxBackend::new(), ControllerConfig::from_settings(settings))
    }
}

impl VllmController {
    pub fn from_settings(settings: &EngineSettings, probe: Arc<dyn AcceleratorProbe>) -> Self {
        Self::new(
            VllmBackend::new(settings.max_model_len, probe),
            ControllerConfig::from_settings(settings),
        )
    }
}

/// Engine-specific launch details.
#[async_trait]
pub trait EngineBackend: Send + Sync + 'static {
    fn kind(&self) -> EngineKind;

    /// Remediation shown when the executable is missing.
    fn install_hint(&self) -> &'static str;

    /// Arguments and environment for serving `model` on `host:port`.
    ///
    /// May probe the machine (e.g. for an accelerator) before answering.
    async fn command(&self, model: &str, host: &str, port: u16) -> EngineCommand;
}
