//! MLX engine (`mlx_lm.server`).

use async_trait::async_trait;
use enginehub_core::EngineKind;

use super::EngineBackend;
use crate::process::EngineCommand;

/// Invocation shape: `mlx_lm.server --model <ref> --port <port> --host <host>`.
///
/// MLX runs on Apple unified memory and needs no device selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlxBackend;

impl MlxBackend {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineBackend for MlxBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Mlx
    }

    fn install_hint(&self) -> &'static str {
        "Install it with: pip install mlx-lm (Apple silicon only)"
    }

    async fn command(&self, model: &str, host: &str, port: u16) -> EngineCommand {
        EngineCommand::default()
            .arg_with_value("--model", model)
            .arg_with_value("--port", port)
            .arg_with_value("--host", host)
    }
}
