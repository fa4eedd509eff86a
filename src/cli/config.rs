use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, CONFIG_FILE};

pub fn run_show() -> Result<()> {
    match Config::load()? {
        Some((config, path)) => {
            eprintln!(
                "{} {}",
                "Config file:".dimmed(),
                path.display().to_string().cyan()
            );
            eprintln!();

            match &config.environment {
                Some(environment) => eprintln!("  environment: {}", environment.yellow()),
                None => eprintln!("  {}", "(no environment selected)".dimmed()),
            }
        }
        None => {
            eprintln!(
                "{} No {} found in current directory or ancestors",
                "⚠".yellow(),
                CONFIG_FILE
            );
            eprintln!();
            eprintln!(
                "Create one with: {}",
                "tinyenvs env select <name>".cyan()
            );
        }
    }

    Ok(())
}
