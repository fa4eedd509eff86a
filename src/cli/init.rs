use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::store::Store;

pub fn run(store_path: &Path) -> Result<()> {
    if Store::exists(store_path) {
        eprintln!(
            "{} Store already exists at {}",
            "✗".red(),
            store_path.display().to_string().yellow()
        );
        eprintln!("  Use other tinyenvs commands to manage your environments.");
        return Ok(());
    }

    let store = Store::init(store_path)?;

    eprintln!();
    eprintln!(
        "{} Environment store created at {}",
        "✓".green(),
        store.path().display().to_string().cyan()
    );
    eprintln!();
    eprintln!("{}", "Quick start:".bold());
    eprintln!(
        "  {} create an environment  tinyenvs env init staging --select",
        "→".cyan()
    );
    eprintln!(
        "  {} record its resources   tinyenvs import staging -f snapshot.json",
        "→".cyan()
    );
    eprintln!("  {} list environments     tinyenvs env ls", "→".cyan());

    Ok(())
}
