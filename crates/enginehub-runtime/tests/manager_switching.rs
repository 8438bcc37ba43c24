//! Orchestration tests: routing, engine switching and shutdown with stub
//! MLX and vLLM engines.

#![cfg(unix)]

mod common;

use common::{StubDir, serve_models_after, stub_config, unused_port};
use enginehub_core::{Accelerator, EngineKind, MockAcceleratorProbe};
use enginehub_runtime::{
    MlxBackend, MlxController, ModelServerManager, VllmBackend, VllmController,
    run_until_shutdown,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const MLX: &str = "mlx_lm.server";
const VLLM: &str = "vllm";

struct Harness {
    stubs: StubDir,
    manager: ModelServerManager,
    mlx_port: u16,
    vllm_port: u16,
}

impl Harness {
    /// Both engines as long-running stubs; neither port answers yet.
    fn new() -> Self {
        let stubs = StubDir::new();
        let mlx_bin = stubs.long_running(MLX);
        let vllm_bin = stubs.long_running(VLLM);
        Self::with_binaries(stubs, &mlx_bin, &vllm_bin)
    }

    fn with_binaries(stubs: StubDir, mlx_bin: &Path, vllm_bin: &Path) -> Self {
        let mlx_port = unused_port();
        let vllm_port = unused_port();

        let mut probe = MockAcceleratorProbe::new();
        probe.expect_detect().return_const(Accelerator::Cpu);

        let mlx = MlxController::new(
            MlxBackend::new(),
            stub_config(EngineKind::Mlx, mlx_bin, mlx_port),
        );
        let vllm = VllmController::new(
            VllmBackend::new(Some(2048), Arc::new(probe)),
            stub_config(EngineKind::Vllm, vllm_bin, vllm_port),
        );

        Self {
            stubs,
            manager: ModelServerManager::new(Arc::new(mlx), Arc::new(vllm)),
            mlx_port,
            vllm_port,
        }
    }
}

#[tokio::test]
async fn test_end_to_end_mlx_demo_model() {
    let h = Harness::new();
    serve_models_after(h.mlx_port, Duration::from_secs(2));

    let started = Instant::now();
    assert!(h.manager.ensure_server_ready("mlx:demo-model").await);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "ready after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3500), "ready after {elapsed:?}");

    let status = h.manager.get_status();
    assert!(status.mlx.running);
    assert_eq!(status.mlx.model_id.as_deref(), Some("demo-model"));
    assert_eq!(
        status.mlx.url,
        Some(format!("http://127.0.0.1:{}/v1", h.mlx_port))
    );
    assert!(!status.vllm.running);
    assert!(h.stubs.launches(VLLM).is_empty());

    h.manager.stop_all_servers().await;
}

#[tokio::test]
async fn test_switching_engines_keeps_one_running() {
    let h = Harness::new();
    serve_models_after(h.mlx_port, Duration::ZERO);
    serve_models_after(h.vllm_port, Duration::ZERO);

    assert!(h.manager.ensure_server_ready("vllm:facebook/opt-125m").await);
    let status = h.manager.get_status();
    assert!(status.vllm.running && !status.mlx.running);

    assert!(h.manager.ensure_server_ready("mlx:demo-model").await);
    let status = h.manager.get_status();
    assert!(status.mlx.running);
    assert!(!status.vllm.running);
    assert!(status.vllm.model_id.is_none());

    assert!(h.manager.ensure_server_ready("huggingface:facebook/opt-125m").await);
    let status = h.manager.get_status();
    assert!(status.vllm.running);
    assert!(!status.mlx.running);

    h.manager.stop_all_servers().await;
}

#[tokio::test]
async fn test_vllm_launch_without_gpu_targets_cpu() {
    let h = Harness::new();
    serve_models_after(h.vllm_port, Duration::ZERO);

    assert!(h.manager.ensure_server_ready("vllm:facebook/opt-125m").await);

    let launch = h.stubs.launches(VLLM).pop().unwrap();
    assert!(launch.contains(" cpu serve facebook/opt-125m"), "{launch}");
    assert!(launch.ends_with("--max-model-len 2048"), "{launch}");

    h.manager.stop_all_servers().await;
}

#[tokio::test]
async fn test_failed_switch_leaves_both_stopped() {
    let stubs = StubDir::new();
    let vllm_bin = stubs.long_running(VLLM);
    let missing_mlx = stubs.path().join("not-installed").join(MLX);
    let h = Harness::with_binaries(stubs, &missing_mlx, &vllm_bin);
    serve_models_after(h.vllm_port, Duration::ZERO);

    assert!(h.manager.ensure_server_ready("vllm:facebook/opt-125m").await);
    assert!(!h.manager.ensure_server_ready("mlx:demo-model").await);

    let status = h.manager.get_status();
    assert!(!status.mlx.running);
    assert!(!status.vllm.running);
    assert!(status.mlx.last_error.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_remote_and_unknown_providers_spawn_nothing() {
    let h = Harness::new();

    assert!(h.manager.ensure_server_ready("ollama:llama3:8b").await);
    assert!(h.manager.ensure_server_ready("anthropic:claude-sonnet").await);
    assert!(h.manager.ensure_server_ready("openai:gpt-4o").await);
    assert!(!h.manager.ensure_server_ready("gpt-4o").await);
    assert!(!h.manager.ensure_server_ready("mystery:model").await);

    assert!(h.stubs.launches(MLX).is_empty());
    assert!(h.stubs.launches(VLLM).is_empty());
    assert!(!h.manager.get_status().any_running());
}

#[tokio::test]
async fn test_concurrent_requests_for_same_model_spawn_once() {
    let h = Harness::new();
    serve_models_after(h.mlx_port, Duration::from_millis(500));

    let (a, b) = tokio::join!(
        h.manager.ensure_server_ready("mlx:demo-model"),
        h.manager.ensure_server_ready("mlx:demo-model")
    );
    assert!(a && b);
    assert_eq!(h.stubs.launches(MLX).len(), 1);

    h.manager.stop_all_servers().await;
}

#[tokio::test]
async fn test_concurrent_requests_for_different_engines_never_overlap() {
    let h = Harness::new();
    serve_models_after(h.mlx_port, Duration::from_millis(500));
    serve_models_after(h.vllm_port, Duration::from_millis(500));

    let (a, b) = tokio::join!(
        h.manager.ensure_server_ready("mlx:a"),
        h.manager.ensure_server_ready("vllm:b")
    );
    assert!(a && b);

    let status = h.manager.get_status();
    assert!(!(status.mlx.running && status.vllm.running));
    assert!(status.any_running());

    h.manager.stop_all_servers().await;
}

#[tokio::test]
async fn test_restart_through_manager() {
    let h = Harness::new();
    serve_models_after(h.mlx_port, Duration::ZERO);

    assert!(h.manager.ensure_server_ready("mlx:demo-model").await);
    assert!(h.manager.restart("mlx:demo-model").await);
    assert_eq!(h.stubs.launches(MLX).len(), 2);
    assert!(h.manager.get_status().mlx.running);

    h.manager.stop_all_servers().await;
}

#[tokio::test]
async fn test_shutdown_stops_all_servers() {
    let h = Harness::new();
    serve_models_after(h.vllm_port, Duration::ZERO);
    assert!(h.manager.ensure_server_ready("vllm:facebook/opt-125m").await);

    run_until_shutdown(&h.manager, async {}).await;

    assert!(!h.manager.get_status().any_running());
    // Idempotent
    h.manager.stop_all_servers().await;
}
