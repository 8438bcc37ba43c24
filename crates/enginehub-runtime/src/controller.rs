//! Generic engine server controller.
//!
//! One controller owns at most one engine child process. Transitions
//! (`start`, `stop`, `restart`) are serialized by an async mutex and run on
//! a detached task, so a caller that gives up waiting never leaves a
//! half-started process behind. Read-only queries (`is_running`, `status`)
//! only touch a short synchronous lock and never wait for a transition.

use chrono::Utc;
use enginehub_core::{
    EngineController, EngineError, EngineKind, EngineSettings, ServerPhase, ServerStatus,
};
use reqwest::Client;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use async_trait::async_trait;

use crate::engines::EngineBackend;
use crate::health::{HEALTH_CHECK_TIMEOUT, is_ready, probe_client};
use crate::poll::{PollStep, poll_until};
use crate::process::{
    ShutdownOutcome, StderrTail, resolve_binary, shutdown_child, spawn_engine,
    spawn_stderr_reader,
};

/// Time the engine gets to exit after SIGTERM before it is killed.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Time to wait for the exit to be observed after SIGKILL.
pub const DEFAULT_KILL_CONFIRM: Duration = Duration::from_secs(2);

/// Stderr lines included in a crash report.
const CRASH_REPORT_LINES: usize = 20;

/// How long a crashed engine's stderr reader may take to drain the pipe.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Runtime parameters of one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Executable name (looked up on `PATH`) or explicit path.
    pub binary: String,
    pub host: String,
    pub port: u16,
    /// Default readiness budget when `start` is given no `max_wait`.
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
    /// Per-request bound of a readiness probe.
    pub health_timeout: Duration,
    pub stop_grace: Duration,
    pub kill_confirm: Duration,
}

impl ControllerConfig {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            host: settings.host.clone(),
            port: settings.port,
            startup_timeout: settings.startup_timeout(),
            poll_interval: settings.poll_interval(),
            health_timeout: HEALTH_CHECK_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
            kill_confirm: DEFAULT_KILL_CONFIRM,
        }
    }

    /// `http://{host}:{port}/v1`
    pub fn base_url(&self) -> String {
        ServerStatus::base_url(&self.host, self.port)
    }
}

/// Mutable per-controller state, guarded by a synchronous mutex.
///
/// Never held across an `.await`.
#[derive(Default)]
struct ManagedServerState {
    model_id: Option<String>,
    process: Option<Child>,
    phase: ServerPhase,
    pid: Option<u32>,
    started_at: Option<i64>,
    stderr: StderrTail,
    stderr_reader: Option<JoinHandle<()>>,
    /// How the last process ended, if it ended on its own.
    last_exit: Option<String>,
    last_error: Option<String>,
}

impl ManagedServerState {
    /// Reap the child if it has exited, clearing the process fields.
    fn refresh(&mut self, engine: EngineKind) {
        let Some(child) = self.process.as_mut() else {
            return;
        };

        let exit = match child.try_wait() {
            Ok(None) => return,
            Ok(Some(status)) => status.to_string(),
            Err(e) => format!("wait failed: {e}"),
        };

        if self.phase == ServerPhase::Running {
            warn!(
                engine = %engine,
                pid = ?self.pid,
                "{} server exited unexpectedly ({})",
                engine,
                exit
            );
        }

        self.last_error = Some(self.stderr.last_line().unwrap_or_else(|| exit.clone()));
        self.last_exit = Some(exit);
        self.process = None;
        self.model_id = None;
        self.pid = None;
        self.started_at = None;
        self.phase = ServerPhase::Stopped;
    }

    fn clear_process(&mut self) {
        self.process = None;
        self.model_id = None;
        self.pid = None;
        self.started_at = None;
        self.phase = ServerPhase::Stopped;
    }
}

/// Outcome of the readiness loop.
enum Startup {
    Ready,
    Exited(String),
}

/// Lifecycle controller for one engine, parameterized by how the engine is
/// invoked. Cheap to clone; clones share the same process.
pub struct ServerController<B: EngineBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: EngineBackend> Clone for ServerController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B> {
    backend: B,
    config: ControllerConfig,
    client: Client,
    /// Serializes start/stop/restart.
    transition: tokio::sync::Mutex<()>,
    state: Mutex<ManagedServerState>,
}

impl<B: EngineBackend> ServerController<B> {
    pub fn new(backend: B, config: ControllerConfig) -> Self {
        let client = probe_client(config.health_timeout);
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                client,
                transition: tokio::sync::Mutex::new(()),
                state: Mutex::new(ManagedServerState::default()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Start serving `model_id` and report why it failed, if it did.
    ///
    /// Same semantics as [`EngineController::start`].
    pub async fn launch(
        &self,
        model_id: &str,
        max_wait: Option<Duration>,
    ) -> Result<(), EngineError> {
        let inner = Arc::clone(&self.inner);
        let model_id = model_id.to_string();
        self.detached(async move {
            let _transition = inner.transition.lock().await;
            inner.start_locked(&model_id, max_wait).await
        })
        .await
    }

    /// Restart with `model_id`, reporting the failure reason.
    pub async fn relaunch(&self, model_id: &str) -> Result<(), EngineError> {
        let inner = Arc::clone(&self.inner);
        let model_id = model_id.to_string();
        self.detached(async move {
            let _transition = inner.transition.lock().await;
            inner.stop_locked().await;
            inner.start_locked(&model_id, None).await
        })
        .await
    }

    /// Most recent stderr lines of the current (or last) process.
    pub fn stderr_tail(&self, n: usize) -> Vec<String> {
        self.inner.lock_state().stderr.last(n)
    }

    /// Run a transition on its own task and wait for it.
    async fn detached<F>(&self, transition: F) -> Result<(), EngineError>
    where
        F: Future<Output = Result<(), EngineError>> + Send + 'static,
    {
        match tokio::spawn(transition).await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Interrupted {
                engine: self.inner.backend.kind(),
                reason: e.to_string(),
            }),
        }
    }
}

impl<B: EngineBackend> Inner<B> {
    fn lock_state(&self) -> MutexGuard<'_, ManagedServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn kind(&self) -> EngineKind {
        self.backend.kind()
    }

    /// Record `err` as the last error and hand it back.
    fn fail(&self, err: EngineError) -> EngineError {
        self.lock_state().last_error = Some(err.to_string());
        err
    }

    /// True if the live process is serving `model_id`.
    fn serving(&self, model_id: &str) -> bool {
        let mut state = self.lock_state();
        state.refresh(self.kind());
        state.process.is_some() && state.model_id.as_deref() == Some(model_id)
    }

    /// `Some(exit)` once the starting process is gone.
    fn observe_exit(&self) -> Option<String> {
        let mut state = self.lock_state();
        state.refresh(self.kind());
        if state.process.is_some() {
            None
        } else {
            Some(state.last_exit.clone().unwrap_or_else(|| "exited".to_string()))
        }
    }

    async fn start_locked(
        &self,
        model_id: &str,
        max_wait: Option<Duration>,
    ) -> Result<(), EngineError> {
        let kind = self.kind();

        if self.serving(model_id) {
            debug!(engine = %kind, model = %model_id, "Already serving requested model");
            return Ok(());
        }

        // Replace whatever is running (a different model or a stale handle)
        self.stop_locked().await;

        let Some(program) = resolve_binary(&self.config.binary) else {
            return Err(self.fail(EngineError::BinaryNotFound {
                engine: kind,
                binary: self.config.binary.clone(),
                hint: self.backend.install_hint(),
            }));
        };

        let command = self
            .backend
            .command(model_id, &self.config.host, self.config.port)
            .await;

        info!(
            engine = %kind,
            model = %model_id,
            "Starting {} server on {}:{}",
            kind,
            self.config.host,
            self.config.port
        );

        let mut child = spawn_engine(&program, &command)
            .map_err(|e| self.fail(self.spawn_error(e)))?;
        let pid = child.id();
        let stderr = StderrTail::new();
        let reader = spawn_stderr_reader(&mut child, kind, stderr.clone());

        {
            let mut state = self.lock_state();
            *state = ManagedServerState {
                model_id: Some(model_id.to_string()),
                process: Some(child),
                phase: ServerPhase::Starting,
                pid,
                started_at: Some(Utc::now().timestamp()),
                stderr: stderr.clone(),
                stderr_reader: reader,
                last_exit: None,
                last_error: None,
            };
        }
        debug!(engine = %kind, pid = ?pid, "Engine process spawned");

        let wait = max_wait.unwrap_or(self.config.startup_timeout);
        let base_url = self.config.base_url();
        let this = self;
        let url = base_url.as_str();
        let outcome = poll_until(wait, self.config.poll_interval, || async move {
            if let Some(exit) = this.observe_exit() {
                return PollStep::Ready(Startup::Exited(exit));
            }
            if is_ready(&this.client, url).await {
                PollStep::Ready(Startup::Ready)
            } else {
                PollStep::Pending
            }
        })
        .await;

        match outcome {
            Some(Startup::Ready) => {
                self.lock_state().phase = ServerPhase::Running;
                info!(engine = %kind, model = %model_id, "{} server ready at {}", kind, base_url);
                Ok(())
            }
            Some(Startup::Exited(status)) => {
                let reader = self.lock_state().stderr_reader.take();
                if let Some(reader) = reader {
                    let _ = timeout(STDERR_DRAIN_TIMEOUT, reader).await;
                }

                let stderr_tail = stderr.last(CRASH_REPORT_LINES);
                warn!(
                    engine = %kind,
                    model = %model_id,
                    "{} exited during startup ({})",
                    kind,
                    status
                );
                for line in &stderr_tail {
                    warn!(engine = %kind, "  {}", line);
                }

                self.lock_state().last_error =
                    Some(stderr.last_line().unwrap_or_else(|| status.clone()));
                Err(EngineError::ProcessCrashed {
                    engine: kind,
                    status,
                    stderr_tail,
                })
            }
            None => {
                error!(
                    engine = %kind,
                    model = %model_id,
                    "{} did not become ready within {:?}, stopping it",
                    kind,
                    wait
                );
                self.stop_locked().await;
                Err(self.fail(EngineError::StartupTimeout {
                    engine: kind,
                    waited_secs: wait.as_secs(),
                }))
            }
        }
    }

    fn spawn_error(&self, e: io::Error) -> EngineError {
        let kind = self.kind();
        if e.kind() == io::ErrorKind::NotFound {
            EngineError::BinaryNotFound {
                engine: kind,
                binary: self.config.binary.clone(),
                hint: self.backend.install_hint(),
            }
        } else {
            EngineError::SpawnFailed {
                engine: kind,
                reason: e.to_string(),
            }
        }
    }

    /// Terminate the current process, if any. Caller holds `transition`.
    async fn stop_locked(&self) {
        let kind = self.kind();

        let (child, model_id, pid, reader) = {
            let mut state = self.lock_state();
            let child = state.process.take();
            if child.is_some() {
                state.phase = ServerPhase::Stopping;
            }
            (child, state.model_id.clone(), state.pid, state.stderr_reader.take())
        };

        let Some(mut child) = child else {
            self.lock_state().clear_process();
            return;
        };

        info!(engine = %kind, model = ?model_id, pid = ?pid, "Stopping {} server", kind);

        match shutdown_child(&mut child, self.config.stop_grace, self.config.kill_confirm).await {
            Ok(ShutdownOutcome::AlreadyExited(status)) => {
                debug!(engine = %kind, "{} had already exited ({})", kind, status);
            }
            Ok(ShutdownOutcome::Graceful(_)) => {
                info!(engine = %kind, "{} server stopped", kind);
            }
            Ok(ShutdownOutcome::Killed(_)) => {
                warn!(
                    engine = %kind,
                    "{} ignored SIGTERM for {:?}, killed",
                    kind,
                    self.config.stop_grace
                );
            }
            Err(e) => {
                // Dropping the handle still kills it
                warn!(engine = %kind, pid = ?pid, "Could not confirm {} exit: {}", kind, e);
            }
        }
        drop(child);

        if let Some(reader) = reader {
            reader.abort();
        }
        self.lock_state().clear_process();
    }

    fn status(&self) -> ServerStatus {
        let mut state = self.lock_state();
        state.refresh(self.kind());

        let running = state.process.is_some();
        ServerStatus {
            engine: self.kind(),
            running,
            phase: state.phase,
            model_id: state.model_id.clone(),
            host: self.config.host.clone(),
            port: self.config.port,
            url: running.then(|| self.config.base_url()),
            pid: state.pid,
            started_at: state.started_at,
            last_error: state.last_error.clone(),
        }
    }
}

#[async_trait]
impl<B: EngineBackend> EngineController for ServerController<B> {
    fn kind(&self) -> EngineKind {
        self.inner.kind()
    }

    fn is_running(&self) -> bool {
        let mut state = self.inner.lock_state();
        state.refresh(self.inner.kind());
        state.process.is_some()
    }

    async fn health_check(&self) -> bool {
        is_ready(&self.inner.client, &self.inner.config.base_url()).await
    }

    async fn start(&self, model_id: &str, max_wait: Option<Duration>) -> bool {
        match self.launch(model_id, max_wait).await {
            Ok(()) => true,
            Err(e) => {
                error!(engine = %self.kind(), model = %model_id, "{}", e);
                false
            }
        }
    }

    async fn stop(&self) {
        let inner = Arc::clone(&self.inner);
        let result = self
            .detached(async move {
                let _transition = inner.transition.lock().await;
                inner.stop_locked().await;
                Ok(())
            })
            .await;
        if let Err(e) = result {
            warn!("{}", e);
        }
    }

    async fn restart(&self, model_id: &str) -> bool {
        match self.relaunch(model_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(engine = %self.kind(), model = %model_id, "{}", e);
                false
            }
        }
    }

    fn status(&self) -> ServerStatus {
        self.inner.status()
    }
}
