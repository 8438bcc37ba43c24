//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter: settings are resolved (defaults, `.env`, process
//! environment, flags) and the `ModelServerManager` is built with the
//! default accelerator probe.
//!
//! Command handlers receive the composed context and delegate work to it.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use enginehub_core::{EngineKind, Settings, validate_settings};
use enginehub_runtime::{DefaultAcceleratorProbe, ModelServerManager};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::parser::Cli;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load `.env` (or an explicit file) into the process environment.
///
/// A missing default `.env` is fine; a missing explicit file is an error.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!("Loaded environment from {}", path.display());
            }
        }
    }
    Ok(())
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Settings,
}

impl CliConfig {
    /// Defaults, then `ENGINEHUB_*` variables, then command-line flags.
    pub fn from_env_and_args(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = Settings::with_defaults();
        settings.apply_env(|key| std::env::var(key).ok())?;
        apply_cli_overrides(&mut settings, cli);
        validate_settings(&settings)?;
        Ok(Self { settings })
    }
}

/// Apply the global flags of `cli` on top of `settings`.
pub fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    for kind in EngineKind::ALL {
        let engine = settings.engine_mut(kind);
        if let Some(host) = &cli.host {
            engine.host.clone_from(host);
        }
        if let Some(timeout) = cli.startup_timeout {
            engine.startup_timeout_secs = timeout;
        }
    }
    if let Some(port) = cli.mlx_port {
        settings.mlx.port = port;
    }
    if let Some(port) = cli.vllm_port {
        settings.vllm.port = port;
    }
    if let Some(binary) = &cli.mlx_binary {
        settings.mlx.binary.clone_from(binary);
    }
    if let Some(binary) = &cli.vllm_binary {
        settings.vllm.binary.clone_from(binary);
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub manager: ModelServerManager,
}

impl CliContext {
    pub fn manager(&self) -> &ModelServerManager {
        &self.manager
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Bootstrap the CLI application.
///
/// Builds one adapter per engine; nothing is spawned until a handler asks
/// for a model.
pub fn bootstrap(config: CliConfig) -> CliContext {
    let probe = Arc::new(DefaultAcceleratorProbe::new());
    let manager = ModelServerManager::from_settings(&config.settings, probe);
    CliContext {
        settings: config.settings,
        manager,
    }
}
