//! Local inference engine identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The local engines this crate knows how to run.
///
/// At most one of them holds the machine's accelerator at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Apple MLX server (`mlx_lm.server`), uses unified memory.
    Mlx,
    /// vLLM OpenAI-compatible server.
    Vllm,
}

impl EngineKind {
    /// All engine kinds, in the order status is reported.
    pub const ALL: [Self; 2] = [Self::Mlx, Self::Vllm];

    /// Lowercase identifier used in provider prefixes and config keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mlx => "mlx",
            Self::Vllm => "vllm",
        }
    }

    /// The engine that competes with this one for the accelerator.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Mlx => Self::Vllm,
            Self::Vllm => Self::Mlx,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mlx" => Ok(Self::Mlx),
            "vllm" => Ok(Self::Vllm),
            other => Err(format!("unknown engine '{other}' (expected mlx or vllm)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_is_symmetric() {
        for kind in EngineKind::ALL {
            assert_ne!(kind, kind.other());
            assert_eq!(kind, kind.other().other());
        }
    }

    #[test]
    fn test_from_str_accepts_any_case() {
        assert_eq!("MLX".parse::<EngineKind>(), Ok(EngineKind::Mlx));
        assert_eq!(" vllm ".parse::<EngineKind>(), Ok(EngineKind::Vllm));
        assert!("ollama".parse::<EngineKind>().is_err());
    }
}
