use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::ConfigResolver;
use crate::store::Store;

pub fn run(store_path: &Path) -> Result<()> {
    let store = Store::open(store_path)?;
    let resolver = ConfigResolver::new()?;

    let envs = store.list_environments()?;

    if envs.is_empty() {
        eprintln!("{} No environments found", "○".yellow());
        eprintln!("  Create one with: tinyenvs env init <name>");
        return Ok(());
    }

    println!("{}", "Environments:".bold());
    for env in envs {
        let marker = if resolver.selected() == Some(env.name.as_str()) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let resources = match env.resource_count {
            Some(1) => "1 resource".to_string(),
            Some(n) => format!("{} resources", n),
            None => "never deployed".to_string(),
        };
        println!(
            "  {} {} {}  {}",
            marker,
            format!("{:<24}", env.name.as_str()).yellow(),
            resources.dimmed(),
            env.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }

    Ok(())
}
