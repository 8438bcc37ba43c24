//! Serve command handler.
//!
//! Brings up the engine for a model and holds it until Ctrl+C/SIGTERM or
//! until the engine dies.

use anyhow::Result;
use enginehub_core::{EngineController, ServerStatus};
use enginehub_runtime::{Route, route, run_until_shutdown, shutdown_signal};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// How often a served engine is checked for an unexpected exit.
const WATCH_INTERVAL: Duration = Duration::from_secs(5);

pub async fn execute(ctx: &CliContext, model: &str) -> Result<()> {
    let manager = ctx.manager();

    let engine = match route(model).map_err(|e| CliError::Arguments(e.to_string()))? {
        Route::Remote(provider) => {
            println!("{model} is served remotely by {provider}; nothing to start.");
            return Ok(());
        }
        Route::Local { engine, .. } => engine,
    };

    println!("Starting {engine} for {model}...");
    if !manager.ensure_server_ready(model).await {
        let status = manager.get_status();
        manager.stop_all_servers().await;
        let reason = status
            .engine(engine)
            .last_error
            .clone()
            .unwrap_or_else(|| "see log output".to_string());
        return Err(CliError::Unavailable(format!("{engine} did not start: {reason}")).into());
    }

    print_status(manager.get_status().engine(engine));
    println!("Press Ctrl+C to stop");

    let controller = Arc::clone(manager.controller(engine));
    let mut crashed = false;
    run_until_shutdown(manager, async {
        tokio::select! {
            () = shutdown_signal() => {},
            () = watch_for_exit(controller.as_ref()) => {
                error!(engine = %engine, "Engine exited unexpectedly");
                crashed = true;
            },
        }
    })
    .await;

    if crashed {
        return Err(CliError::Process(format!("{engine} exited unexpectedly")).into());
    }
    info!("Shutdown complete");
    Ok(())
}

/// Resolves once `controller` no longer has a live process.
async fn watch_for_exit(controller: &dyn EngineController) {
    let mut ticker = tokio::time::interval(WATCH_INTERVAL);
    loop {
        ticker.tick().await;
        if !controller.is_running() {
            return;
        }
    }
}

fn print_status(status: &ServerStatus) {
    println!(
        "{} serving {} at {}",
        status.engine,
        status.model_id.as_deref().unwrap_or("-"),
        status.url.as_deref().unwrap_or("-")
    );
    if let Some(pid) = status.pid {
        println!("pid: {pid}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginehub_core::{EngineKind, MockEngineController};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_watch_returns_when_engine_dies() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let mut mock = MockEngineController::new();
        mock.expect_kind().return_const(EngineKind::Mlx);
        mock.expect_is_running()
            .returning(move || seen.fetch_add(1, Ordering::SeqCst) < 2);

        watch_for_exit(&mock).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
