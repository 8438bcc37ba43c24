//! Application shutdown helpers.

use std::future::Future;
use tokio::signal;
use tracing::{info, warn};

use crate::manager::ModelServerManager;

/// Resolves on Ctrl+C, or SIGTERM on Unix.
///
/// A handler that cannot be installed is logged and ignored; the other
/// signal still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

/// Wait for `signal`, then stop every engine the manager owns.
pub async fn run_until_shutdown<S>(manager: &ModelServerManager, signal: S)
where
    S: Future<Output = ()>,
{
    signal.await;
    manager.stop_all_servers().await;
    info!("All engine servers stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginehub_core::{EngineKind, MockEngineController};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_stops_all_servers_after_signal() {
        let mut mlx = MockEngineController::new();
        let mut vllm = MockEngineController::new();
        mlx.expect_kind().return_const(EngineKind::Mlx);
        vllm.expect_kind().return_const(EngineKind::Vllm);
        mlx.expect_stop().times(1).return_const(());
        vllm.expect_stop().times(1).return_const(());
        let manager = ModelServerManager::new(Arc::new(mlx), Arc::new(vllm));

        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).unwrap();
        run_until_shutdown(&manager, async {
            let _ = rx.await;
        })
        .await;
    }
}
