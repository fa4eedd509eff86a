use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::config::ConfigResolver;
use crate::environment::EnvironmentInfo;
use crate::store::Store;

pub fn run(store_path: &Path, environment: Option<&str>, output: Option<&str>) -> Result<()> {
    let environment = ConfigResolver::new()?.environment(environment)?;
    let store = Store::open(store_path)?;
    let info = EnvironmentInfo::resolve(&store, &environment)?;

    let Some(snapshot) = &info.snapshot else {
        anyhow::bail!("'{}' has no snapshot to export", info.name());
    };
    let json = serde_json::to_string_pretty(snapshot)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            file.write_all(json.as_bytes())?;

            eprintln!(
                "{} Exported {} resources to {}",
                "✓".green(),
                snapshot.resources.len().to_string().bold(),
                path.cyan()
            );
        }
        None => {
            // Output to stdout for piping
            println!("{}", json);
        }
    }

    Ok(())
}
