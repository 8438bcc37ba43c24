//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Command-line interface for the local inference engine orchestrator.
///
/// Global options override the `ENGINEHUB_*` environment settings for this
/// invocation.
#[derive(Parser, Debug)]
#[command(name = "enginehub")]
#[command(about = "Run local MLX and vLLM inference servers, one at a time")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Read environment overrides from this file instead of ./.env
    #[arg(long = "env-file", env = "ENGINEHUB_ENV_FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// Bind host for both engines
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port for the MLX server
    #[arg(long = "mlx-port", global = true)]
    pub mlx_port: Option<u16>,

    /// Port for the vLLM server
    #[arg(long = "vllm-port", global = true)]
    pub vllm_port: Option<u16>,

    /// MLX server executable (name on PATH or explicit path)
    #[arg(long = "mlx-binary", global = true)]
    pub mlx_binary: Option<String>,

    /// vLLM executable (name on PATH or explicit path)
    #[arg(long = "vllm-binary", global = true)]
    pub vllm_binary: Option<String>,

    /// Seconds to wait for an engine to become ready (both engines)
    #[arg(long = "startup-timeout", global = true)]
    pub startup_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
