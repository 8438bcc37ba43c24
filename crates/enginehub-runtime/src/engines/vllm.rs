//! vLLM engine (`vllm serve`).

use async_trait::async_trait;
use enginehub_core::settings::DEFAULT_VLLM_MAX_MODEL_LEN;
use enginehub_core::{Accelerator, AcceleratorProbe, EngineKind};
use std::sync::Arc;
use tracing::{info, warn};

use super::EngineBackend;
use crate::process::EngineCommand;

/// Environment variable vLLM reads to select its platform.
const TARGET_DEVICE_ENV: &str = "VLLM_TARGET_DEVICE";

/// Invocation shape:
/// `vllm serve <ref> --port <port> --host <host> --max-model-len <n>`.
///
/// Before every launch the accelerator is probed. Without a CUDA or ROCm
/// GPU the engine is pinned to its CPU backend; the unified-memory path
/// MLX uses is not available to vLLM.
pub struct VllmBackend {
    max_model_len: u32,
    probe: Arc<dyn AcceleratorProbe>,
}

impl VllmBackend {
    pub fn new(max_model_len: Option<u32>, probe: Arc<dyn AcceleratorProbe>) -> Self {
        Self {
            max_model_len: max_model_len.unwrap_or(DEFAULT_VLLM_MAX_MODEL_LEN),
            probe,
        }
    }

    async fn detect_accelerator(&self) -> Accelerator {
        let probe = Arc::clone(&self.probe);
        match tokio::task::spawn_blocking(move || probe.detect()).await {
            Ok(accelerator) => accelerator,
            Err(e) => {
                warn!("Accelerator probe failed ({e}), falling back to CPU");
                Accelerator::Cpu
            }
        }
    }
}

#[async_trait]
impl EngineBackend for VllmBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Vllm
    }

    fn install_hint(&self) -> &'static str {
        "Install it with: pip install vllm"
    }

    async fn command(&self, model: &str, host: &str, port: u16) -> EngineCommand {
        let accelerator = self.detect_accelerator().await;

        let cmd = EngineCommand::new(["serve", model])
            .arg_with_value("--port", port)
            .arg_with_value("--host", host)
            .arg_with_value("--max-model-len", self.max_model_len);

        if accelerator.is_gpu() {
            info!(accelerator = %accelerator, "vLLM will use GPU");
            cmd
        } else {
            info!("No CUDA/ROCm GPU detected, running vLLM on CPU");
            cmd.env(TARGET_DEVICE_ENV, "cpu")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginehub_core::MockAcceleratorProbe;

    fn backend_with(accelerator: Accelerator) -> VllmBackend {
        let mut probe = MockAcceleratorProbe::new();
        probe.expect_detect().times(1).return_const(accelerator);
        VllmBackend::new(Some(8192), Arc::new(probe))
    }

    #[tokio::test]
    async fn test_command_shape_on_gpu() {
        let cmd = backend_with(Accelerator::Cuda)
            .command("Qwen/Qwen2.5-7B-Instruct", "127.0.0.1", 8001)
            .await;
        assert_eq!(
            cmd.args,
            vec![
                "serve",
                "Qwen/Qwen2.5-7B-Instruct",
                "--port",
                "8001",
                "--host",
                "127.0.0.1",
                "--max-model-len",
                "8192"
            ]
        );
        assert!(cmd.envs.is_empty());
    }

    #[tokio::test]
    async fn test_cpu_fallback_sets_target_device() {
        let cmd = backend_with(Accelerator::Cpu)
            .command("facebook/opt-125m", "127.0.0.1", 8001)
            .await;
        assert_eq!(cmd.args[0], "serve");
        assert_eq!(
            cmd.envs,
            vec![(TARGET_DEVICE_ENV.to_string(), "cpu".to_string())]
        );
    }

    #[tokio::test]
    async fn test_probe_runs_on_every_launch() {
        let mut probe = MockAcceleratorProbe::new();
        probe.expect_detect().times(2).return_const(Accelerator::Rocm);
        let backend = VllmBackend::new(None, Arc::new(probe));

        for _ in 0..2 {
            let cmd = backend.command("m", "127.0.0.1", 8001).await;
            assert!(cmd.args.contains(&DEFAULT_VLLM_MAX_MODEL_LEN.to_string()));
        }
    }
}
