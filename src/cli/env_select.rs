use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::environment::EnvironmentInfo;
use crate::store::Store;

pub fn run(store_path: &Path, name: &str) -> Result<()> {
    let store = Store::open(store_path)?;
    let info = EnvironmentInfo::resolve(&store, name)?;

    let cwd = std::env::current_dir()?;
    let path = Config::select_in(&cwd, info.name().as_str())?;

    eprintln!(
        "{} Selected {} in {}",
        "✓".green(),
        info.name().as_str().yellow(),
        path.display().to_string().cyan()
    );

    Ok(())
}
