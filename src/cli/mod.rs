pub mod config;
pub mod env_init;
pub mod env_ls;
pub mod env_rm;
pub mod env_select;
pub mod env_show;
pub mod export;
pub mod import;
pub mod init;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tinyenvs")]
#[command(
    author,
    version,
    about = "📦 tinyenvs - Local registry of deployment environments"
)]
#[command(long_about = r#"
tinyenvs keeps track of named deployment environments and the resources
recorded in each environment's latest snapshot.

QUICK START:
  tinyenvs init                              # Create the store
  tinyenvs env init staging --select         # Create and select an environment
  tinyenvs import staging -f snapshot.json   # Record deployed resources
  tinyenvs env ls                            # List environments

REMOVING ENVIRONMENTS:
  tinyenvs env rm staging                    # Asks for confirmation
  tinyenvs env rm staging --yes --force      # Even if resources are recorded

Removing an environment only deletes its records. It never destroys the
resources themselves.
"#)]
pub struct Cli {
    /// Path to the store database (default: ~/.tinyenvs/store.db)
    #[arg(long, global = true, env = "TINYENVS_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new environment store
    Init,

    /// Manage environments
    #[command(visible_alias = "e")]
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// Record a resource snapshot for an environment from JSON
    Import {
        /// Environment (defaults to the selected one)
        environment: Option<String>,
        /// Read from file instead of stdin
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Write an environment's snapshot as JSON
    Export {
        /// Environment (defaults to the selected one)
        environment: Option<String>,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect the local .tinyenvs.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum EnvAction {
    /// Create an environment
    Init {
        /// Environment name
        name: String,
        /// Also select the new environment in .tinyenvs.toml
        #[arg(short, long)]
        select: bool,
    },

    /// List environments
    #[command(visible_alias = "list")]
    Ls,

    /// Select the environment used when none is given
    Select {
        /// Environment name
        name: String,
    },

    /// Show an environment and its recorded resources
    Show {
        /// Environment (defaults to the selected one)
        name: Option<String>,
    },

    /// Remove an environment and its configuration
    #[command(visible_alias = "remove")]
    #[command(long_about = r#"Remove an environment and its configuration

This command removes an environment and its recorded snapshot. It does not
destroy the resources the snapshot describes; that is a distinct operation.

After this command completes, the environment will no longer be available."#)]
    Rm {
        /// Environment name
        name: Option<String>,
        /// By default, removal of an environment with resources is rejected; this forces it
        #[arg(short, long)]
        force: bool,
        /// Skip the confirmation prompt and proceed with removal anyway
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the config file in effect
    Show,
}

/// Ask the user to type the environment name before removing it.
///
/// Anything else, including end of input, declines.
pub fn confirm_removal(environment: &str) -> bool {
    use colored::Colorize;

    eprintln!(
        "{} This will permanently remove the '{}' environment!",
        "⚠".yellow(),
        environment.bold()
    );
    eprint!(
        "Please confirm by typing the environment name ({}): ",
        environment.cyan()
    );

    let mut input = String::new();
    match std::io::stdin().read_line(&mut input) {
        Ok(0) => false,
        Ok(_) => input.trim() == environment,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read confirmation");
            false
        }
    }
}
