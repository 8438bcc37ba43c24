//! Route command handler.
//!
//! Shows where a model identifier would be served. Starts nothing.

use anyhow::Result;
use enginehub_core::Settings;
use enginehub_runtime::{Route, route};

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub fn execute(ctx: &CliContext, model: &str) -> Result<()> {
    let provider = ctx.manager().detect_provider(model);
    println!("Provider: {provider}");
    println!("{}", describe(ctx.settings(), model)?);
    Ok(())
}

fn describe(settings: &Settings, model: &str) -> Result<String, CliError> {
    match route(model).map_err(|e| CliError::Arguments(e.to_string()))? {
        Route::Remote(provider) => Ok(format!(
            "Served remotely by {provider}; no local engine needed"
        )),
        Route::Local { engine, reference } => Ok(format!(
            "Engine: {engine} serving '{reference}' at {}",
            settings.engine(engine).base_url()
        )),
    }
}
