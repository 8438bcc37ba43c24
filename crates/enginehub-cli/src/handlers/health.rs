//! Health command handler.

use anyhow::Result;
use enginehub_core::EngineKind;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Probe `GET /v1/models` on the configured endpoint of `engine` once.
///
/// Works for engines started outside this process too.
pub async fn execute(ctx: &CliContext, engine: EngineKind) -> Result<()> {
    let url = ctx.settings().engine(engine).base_url();
    let ready = ctx.manager().controller(engine).health_check().await;
    println!("{}", format_result(engine, &url, ready));

    if ready {
        Ok(())
    } else {
        Err(CliError::Unavailable(format!("{engine} is not answering at {url}")).into())
    }
}

fn format_result(engine: EngineKind, url: &str, ready: bool) -> String {
    let state = if ready { "ready" } else { "not ready" };
    format!("{engine} ({url}): {state}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_result() {
        assert_eq!(
            format_result(EngineKind::Mlx, "http://127.0.0.1:8080/v1", true),
            "mlx (http://127.0.0.1:8080/v1): ready"
        );
        assert!(format_result(EngineKind::Vllm, "u", false).ends_with("not ready"));
    }
}
