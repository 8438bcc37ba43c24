//! `provider:model` identifier parsing.
//!
//! Callers name a model as `"{provider}:{reference}"`, for example
//! `mlx:mlx-community/Qwen2.5-7B-Instruct-4bit` or `anthropic:claude-sonnet`.
//! The provider prefix decides whether a local engine has to be running
//! before the request can be served.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::EngineKind;

/// Backend that serves a requested model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local MLX engine.
    Mlx,
    /// Local vLLM engine. `huggingface:` is accepted as a deprecated alias.
    Vllm,
    /// Ollama daemon, managed outside this crate.
    Ollama,
    /// Hosted Anthropic API.
    Anthropic,
    /// Hosted `OpenAI` API.
    OpenAi,
    /// Anything else, including identifiers without a `:`.
    Unknown,
}

/// Deprecated provider prefix that now routes to vLLM.
const HUGGINGFACE_ALIAS: &str = "huggingface";

impl Provider {
    /// Parse a provider token (the part before the first `:`).
    ///
    /// Matching is ASCII case-insensitive. The `huggingface` alias is
    /// rewritten to [`Provider::Vllm`] with a warning.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "mlx" => Self::Mlx,
            "vllm" => Self::Vllm,
            "ollama" => Self::Ollama,
            "anthropic" => Self::Anthropic,
            "openai" => Self::OpenAi,
            HUGGINGFACE_ALIAS => {
                warn!(
                    "Provider prefix '{HUGGINGFACE_ALIAS}:' is deprecated, use 'vllm:' instead"
                );
                Self::Vllm
            }
            _ => Self::Unknown,
        }
    }

    /// Local engine that has to be running for this provider, if any.
    #[must_use]
    pub const fn engine(self) -> Option<EngineKind> {
        match self {
            Self::Mlx => Some(EngineKind::Mlx),
            Self::Vllm => Some(EngineKind::Vllm),
            Self::Ollama | Self::Anthropic | Self::OpenAi | Self::Unknown => None,
        }
    }

    /// True for providers that need no local process from this crate.
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Self::Ollama | Self::Anthropic | Self::OpenAi)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mlx => "mlx",
            Self::Vllm => "vllm",
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `provider:reference` model identifier.
///
/// Parsed fresh on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestedModel {
    pub provider: Provider,
    /// Everything after the first `:`; may itself contain colons
    /// (e.g. `ollama:llama3:8b`). Empty when the identifier has no `:`.
    pub reference: String,
}

impl RequestedModel {
    /// Split an identifier on its first `:`.
    pub fn parse(model_id: &str) -> Self {
        match model_id.split_once(':') {
            Some((token, reference)) => Self {
                provider: Provider::from_token(token),
                reference: reference.trim().to_string(),
            },
            None => Self {
                provider: Provider::Unknown,
                reference: String::new(),
            },
        }
    }
}

/// Detect the provider of a `provider:model` identifier.
///
/// An identifier without `:` yields [`Provider::Unknown`].
pub fn detect_provider(model_id: &str) -> Provider {
    RequestedModel::parse(model_id).provider
}
