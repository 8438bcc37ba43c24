//! CLI entry point - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together via bootstrap.
//! Command dispatch routes to handlers which delegate to the manager.

use clap::{CommandFactory, Parser};

use enginehub_cli::error::exit_code_for;
use enginehub_cli::{Cli, CliConfig, Commands, bootstrap, handlers, init_logging};
use enginehub_cli::bootstrap::load_env_file;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code_for(&e));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load environment variables before the subscriber reads RUST_LOG
    load_env_file(cli.env_file.as_deref())?;
    init_logging(cli.verbose);

    let Some(command) = cli.command.as_ref() else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    // Bootstrap the CLI context (composition root)
    let config = CliConfig::from_env_and_args(&cli)?;
    let ctx = bootstrap(config);

    match command {
        Commands::Serve { model } => {
            handlers::serve::execute(&ctx, model).await?;
        }
        Commands::Route { model } => {
            handlers::route::execute(&ctx, model)?;
        }
        Commands::Health { engine } => {
            handlers::health::execute(&ctx, *engine).await?;
        }
        Commands::Config => {
            handlers::config::execute(&ctx)?;
        }
    }

    Ok(())
}
