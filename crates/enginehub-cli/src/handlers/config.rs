//! Config command handler.

use anyhow::Result;
use enginehub_core::Settings;

use crate::bootstrap::CliContext;

/// Print the effective settings as pretty JSON.
pub fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", render(ctx.settings())?);
    Ok(())
}

fn render(settings: &Settings) -> Result<String> {
    Ok(serde_json::to_string_pretty(settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_both_engines() {
        let json = render(&Settings::with_defaults()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mlx"]["binary"], "mlx_lm.server");
        assert_eq!(value["vllm"]["max_model_len"], 4096);
        assert!(value["mlx"].get("max_model_len").is_none());
    }
}
