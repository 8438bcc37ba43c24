//! Subcommands.

use clap::Subcommand;
use enginehub_core::EngineKind;

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the engine for a model and keep it running until Ctrl+C
    Serve {
        /// Model identifier, e.g. "mlx:mlx-community/Qwen2.5-7B-Instruct-4bit"
        model: String,
    },

    /// Show which provider and engine would serve a model, without starting anything
    Route {
        /// Model identifier in "provider:model" form
        model: String,
    },

    /// Probe the configured endpoint of an engine once
    Health {
        /// Engine to probe: "mlx" or "vllm"
        #[arg(long)]
        engine: EngineKind,
    },

    /// Print the effective settings as JSON
    Config,
}
