//! Model server manager.
//!
//! Routes `provider:model` identifiers to the engine that serves them and
//! keeps at most one local engine serving at a time. Hosted providers
//! (Ollama, Anthropic, OpenAI) need no local process and are passed through.

use enginehub_core::{
    AcceleratorProbe, EngineController, EngineKind, ManagerStatus, Provider, ProviderError,
    RequestedModel, Settings,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::engines::{MlxController, VllmController};

/// Where a request is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Hosted provider; nothing to start.
    Remote(Provider),
    /// Local engine serving `reference`.
    Local { engine: EngineKind, reference: String },
}

/// Resolve a `provider:model` identifier to a route.
pub fn route(model_id: &str) -> Result<Route, ProviderError> {
    let requested = RequestedModel::parse(model_id);
    match requested.provider {
        Provider::Unknown => Err(ProviderError::UnknownProvider(model_id.to_string())),
        provider if provider.is_remote() => Ok(Route::Remote(provider)),
        provider => {
            let Some(engine) = provider.engine() else {
                return Err(ProviderError::UnknownProvider(model_id.to_string()));
            };
            if requested.reference.is_empty() {
                return Err(ProviderError::MissingReference(model_id.to_string()));
            }
            Ok(Route::Local {
                engine,
                reference: requested.reference,
            })
        }
    }
}

/// `Some((engine, reference))` for a local route, `None` for a hosted one.
fn local_target(model_id: &str) -> Result<Option<(EngineKind, String)>, ProviderError> {
    match route(model_id)? {
        Route::Local { engine, reference } => Ok(Some((engine, reference))),
        Route::Remote(provider) => {
            debug!(provider = %provider, "Hosted provider, no local server needed");
            Ok(None)
        }
    }
}

/// Orchestrates the MLX and vLLM adapters.
///
/// Constructed once at startup and handed to whoever needs inference; the
/// adapters live as long as the manager.
pub struct ModelServerManager {
    mlx: Arc<dyn EngineController>,
    vllm: Arc<dyn EngineController>,
    /// Held across stop-other + start so two switches cannot interleave.
    switch: Mutex<()>,
}

impl ModelServerManager {
    pub fn new(mlx: Arc<dyn EngineController>, vllm: Arc<dyn EngineController>) -> Self {
        Self {
            mlx,
            vllm,
            switch: Mutex::new(()),
        }
    }

    /// Build both adapters from validated settings.
    pub fn from_settings(settings: &Settings, probe: Arc<dyn AcceleratorProbe>) -> Self {
        Self::new(
            Arc::new(MlxController::from_settings(&settings.mlx)),
            Arc::new(VllmController::from_settings(&settings.vllm, probe)),
        )
    }

    pub fn detect_provider(&self, model_id: &str) -> Provider {
        enginehub_core::detect_provider(model_id)
    }

    /// Adapter for `kind`.
    pub fn controller(&self, kind: EngineKind) -> &Arc<dyn EngineController> {
        match kind {
            EngineKind::Mlx => &self.mlx,
            EngineKind::Vllm => &self.vllm,
        }
    }

    /// Make sure the engine for `model_id` is serving it.
    ///
    /// Hosted providers return `true` without touching any process. For a
    /// local provider the other engine is stopped first, then the target
    /// adapter is started. Never fails; `false` means inference is not
    /// available right now.
    pub async fn ensure_server_ready(&self, model_id: &str) -> bool {
        let (engine, reference) = match local_target(model_id) {
            Ok(Some(local)) => local,
            Ok(None) => return true,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };

        let _switch = self.switch.lock().await;
        self.stop_other(engine).await;
        let target = self.controller(engine);
        info!(engine = %engine, model = %reference, "Ensuring {} is serving {}", engine, reference);
        target.start(&reference, None).await
    }

    /// Restart the engine serving `model_id`.
    ///
    /// Routed like [`ensure_server_ready`](Self::ensure_server_ready);
    /// hosted providers are a no-op that reports success.
    pub async fn restart(&self, model_id: &str) -> bool {
        let (engine, reference) = match local_target(model_id) {
            Ok(Some(local)) => local,
            Ok(None) => return true,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };

        let _switch = self.switch.lock().await;
        self.stop_other(engine).await;
        info!(engine = %engine, model = %reference, "Restarting {}", engine);
        self.controller(engine).restart(&reference).await
    }

    /// Stop both engines. Each stop is independent of the other.
    pub async fn stop_all_servers(&self) {
        info!("Stopping all engine servers");
        tokio::join!(self.mlx.stop(), self.vllm.stop());
    }

    pub fn get_status(&self) -> ManagerStatus {
        ManagerStatus {
            mlx: self.mlx.status(),
            vllm: self.vllm.status(),
        }
    }

    /// Stop the engine that is not `engine`. Caller holds `switch`.
    ///
    /// Always issued: a stop is idempotent and also waits out a start of
    /// the other engine left running by an abandoned request.
    async fn stop_other(&self, engine: EngineKind) {
        let other_kind = engine.other();
        let other = self.controller(other_kind);
        if other.is_running() {
            info!(
                engine = %other_kind,
                "Stopping {} to free resources for {}",
                other_kind,
                engine
            );
        }
        other.stop().await;
    }
}
