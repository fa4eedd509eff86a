use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::environment::EnvName;
use crate::store::Store;

pub fn run(store_path: &Path, name: &str, select: bool) -> Result<()> {
    let name = EnvName::parse(name).with_context(|| format!("Invalid environment name '{}'", name))?;
    let store = Store::open(store_path)?;

    let target = store.create_environment(&name)?;

    eprintln!(
        "{} Created environment {}",
        "✓".green(),
        target.name().as_str().yellow()
    );

    if select {
        let cwd = std::env::current_dir()?;
        let path = Config::select_in(&cwd, name.as_str())?;
        eprintln!(
            "  {} selected in {}",
            "└".dimmed(),
            path.display().to_string().cyan()
        );
    }

    Ok(())
}
