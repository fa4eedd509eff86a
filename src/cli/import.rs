use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use crate::config::ConfigResolver;
use crate::environment::{EnvironmentInfo, Snapshot};
use crate::store::Store;

pub fn run(store_path: &Path, environment: Option<&str>, file: Option<&str>) -> Result<()> {
    let environment = ConfigResolver::new()?.environment(environment)?;

    let json = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path))?,
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!(
                    "No input provided. Pipe a snapshot or specify a file:\n\
                     \n  tinyenvs import {} --file snapshot.json",
                    environment
                );
            }
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .context("Failed to read snapshot from stdin")?;
            buf
        }
    };

    let snapshot: Snapshot =
        serde_json::from_str(&json).context("Failed to parse snapshot (invalid format)")?;

    let store = Store::open(store_path)?;
    let info = EnvironmentInfo::resolve(&store, &environment)?;

    eprintln!(
        "{} Recording snapshot for {} ({} resources)...",
        "→".cyan(),
        info.name().as_str().yellow(),
        snapshot.resources.len()
    );

    store.save_snapshot(&info.target, &snapshot)?;

    eprintln!(
        "{} Recorded {} resources for {}",
        "✓".green(),
        snapshot.resources.len().to_string().bold(),
        info.name().as_str().yellow()
    );

    Ok(())
}
