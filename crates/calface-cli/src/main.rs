use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use calface_cli::commands::{layout, watch, window};
use calface_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so layouts on stdout stay machine-readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Layout {
            input,
            at,
            engine,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            layout::run(
                &mut stdout,
                input,
                at.as_deref(),
                engine.map(Into::into),
                *json,
                &config.layout,
            )?;
        }
        Some(Commands::Window { at }) => {
            window::run(&mut stdout, at.as_deref())?;
        }
        Some(Commands::Watch { input }) => {
            let config = load_config(cli.config.as_deref())?;
            drop(stdout);
            watch::run(input, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
