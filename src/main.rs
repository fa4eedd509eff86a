mod cli;
mod config;
mod environment;
mod removal;
mod store;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ConfigAction, EnvAction};
use store::Store;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("TINYENVS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let store_path = match cli.store {
        Some(path) => path,
        None => Store::default_path()?,
    };

    match cli.command {
        Commands::Init => cli::init::run(&store_path)?,
        Commands::Env { action } => match action {
            EnvAction::Init { name, select } => cli::env_init::run(&store_path, &name, select)?,
            EnvAction::Ls => cli::env_ls::run(&store_path)?,
            EnvAction::Select { name } => cli::env_select::run(&store_path, &name)?,
            EnvAction::Show { name } => cli::env_show::run(&store_path, name.as_deref())?,
            EnvAction::Rm { name, force, yes } => {
                cli::env_rm::run(&store_path, name.as_deref(), force, yes)?
            }
        },
        Commands::Import { environment, file } => {
            cli::import::run(&store_path, environment.as_deref(), file.as_deref())?
        }
        Commands::Export {
            environment,
            output,
        } => cli::export::run(&store_path, environment.as_deref(), output.as_deref())?,
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::config::run_show()?,
        },
    }

    Ok(())
}
