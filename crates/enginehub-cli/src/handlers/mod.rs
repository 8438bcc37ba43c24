//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that call the manager and format output for the terminal

pub mod config;
pub mod health;
pub mod route;
pub mod serve;
