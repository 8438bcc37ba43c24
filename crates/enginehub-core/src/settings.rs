//! Settings domain types and validation.
//!
//! Per-engine host, port, timeouts and executable. These are constructor
//! inputs for the runtime controllers; nothing reads them from globals.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{EngineKind, ServerStatus};

/// Default bind host for local engines.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the MLX engine.
pub const DEFAULT_MLX_PORT: u16 = 8080;

/// Default port for the vLLM engine. Distinct from MLX and from the
/// application's own port.
pub const DEFAULT_VLLM_PORT: u16 = 8001;

/// Default vLLM `--max-model-len`.
pub const DEFAULT_VLLM_MAX_MODEL_LEN: u32 = 4096;

/// Prefix for environment overrides, e.g. `ENGINEHUB_MLX_PORT`.
pub const ENV_PREFIX: &str = "ENGINEHUB";

/// Settings for one engine adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSettings {
    /// Executable name (resolved on `PATH`) or explicit path.
    pub binary: String,
    pub host: String,
    pub port: u16,
    /// Readiness budget for `start()`. Large for MLX because the first run
    /// downloads multi-gigabyte weights.
    pub startup_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// vLLM only: value for `--max-model-len`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_model_len: Option<u32>,
}

impl EngineSettings {
    /// MLX defaults: port 8080, 120 s startup, 1 s poll.
    pub fn mlx_defaults() -> Self {
        Self {
            binary: "mlx_lm.server".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_MLX_PORT,
            startup_timeout_secs: 120,
            poll_interval_secs: 1,
            max_model_len: None,
        }
    }

    /// vLLM defaults: port 8001, 60 s startup, 2 s poll.
    pub fn vllm_defaults() -> Self {
        Self {
            binary: "vllm".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_VLLM_PORT,
            startup_timeout_secs: 60,
            poll_interval_secs: 2,
            max_model_len: Some(DEFAULT_VLLM_MAX_MODEL_LEN),
        }
    }

    pub fn defaults_for(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Mlx => Self::mlx_defaults(),
            EngineKind::Vllm => Self::vllm_defaults(),
        }
    }

    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// OpenAI-compatible base URL (`http://host:port/v1`).
    pub fn base_url(&self) -> String {
        ServerStatus::base_url(&self.host, self.port)
    }

    /// Apply `ENGINEHUB_{ENGINE}_{FIELD}` overrides from `lookup`.
    fn apply_env<F>(&mut self, kind: EngineKind, lookup: &F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine = kind.as_str().to_ascii_uppercase();
        let key = |field: &str| format!("{ENV_PREFIX}_{engine}_{field}");

        if let Some(binary) = lookup(&key("BINARY")) {
            self.binary = binary;
        }
        if let Some(host) = lookup(&key("HOST")) {
            self.host = host;
        }
        if let Some(port) = parse_env(lookup, &key("PORT"))? {
            self.port = port;
        }
        if let Some(secs) = parse_env(lookup, &key("STARTUP_TIMEOUT_SECS"))? {
            self.startup_timeout_secs = secs;
        }
        if let Some(secs) = parse_env(lookup, &key("POLL_INTERVAL_SECS"))? {
            self.poll_interval_secs = secs;
        }
        if kind == EngineKind::Vllm {
            if let Some(len) = parse_env(lookup, &key("MAX_MODEL_LEN"))? {
                self.max_model_len = Some(len);
            }
        }
        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, key: &str) -> Result<Option<T>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::InvalidEnvValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

/// Application settings: one block per local engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub mlx: EngineSettings,
    pub vllm: EngineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Create settings with the documented per-engine defaults.
    pub fn with_defaults() -> Self {
        Self {
            mlx: EngineSettings::mlx_defaults(),
            vllm: EngineSettings::vllm_defaults(),
        }
    }

    /// Defaults overridden by the process environment, then validated.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::with_defaults();
        settings.apply_env(|key| std::env::var(key).ok())?;
        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Apply environment-style overrides from an arbitrary lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.mlx.apply_env(EngineKind::Mlx, &lookup)?;
        self.vllm.apply_env(EngineKind::Vllm, &lookup)
    }

    #[must_use]
    pub const fn engine(&self, kind: EngineKind) -> &EngineSettings {
        match kind {
            EngineKind::Mlx => &self.mlx,
            EngineKind::Vllm => &self.vllm,
        }
    }

    pub const fn engine_mut(&mut self, kind: EngineKind) -> &mut EngineSettings {
        match kind {
            EngineKind::Mlx => &mut self.mlx,
            EngineKind::Vllm => &mut self.vllm,
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{engine}: port should be >= 1024 (privileged ports require root), got {port}")]
    InvalidPort { engine: EngineKind, port: u16 },

    #[error("mlx and vllm cannot share port {0}")]
    PortConflict(u16),

    #[error("{0}: startup timeout must be at least 1 second")]
    ZeroStartupTimeout(EngineKind),

    #[error("{0}: poll interval must be at least 1 second")]
    ZeroPollInterval(EngineKind),

    #[error("{0}: engine binary cannot be empty")]
    EmptyBinary(EngineKind),

    #[error("{0}: host cannot be empty")]
    EmptyHost(EngineKind),

    #[error("vllm: max model length must be positive")]
    InvalidMaxModelLen,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnvValue { key: String, value: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    for kind in EngineKind::ALL {
        let engine = settings.engine(kind);

        if engine.port < 1024 {
            return Err(SettingsError::InvalidPort {
                engine: kind,
                port: engine.port,
            });
        }
        if engine.startup_timeout_secs == 0 {
            return Err(SettingsError::ZeroStartupTimeout(kind));
        }
        if engine.poll_interval_secs == 0 {
            return Err(SettingsError::ZeroPollInterval(kind));
        }
        if engine.binary.trim().is_empty() {
            return Err(SettingsError::EmptyBinary(kind));
        }
        if engine.host.trim().is_empty() {
            return Err(SettingsError::EmptyHost(kind));
        }
    }

    if settings.mlx.port == settings.vllm.port {
        return Err(SettingsError::PortConflict(settings.mlx.port));
    }

    if settings.vllm.max_model_len == Some(0) {
        return Err(SettingsError::InvalidMaxModelLen);
    }

    Ok(())
}
