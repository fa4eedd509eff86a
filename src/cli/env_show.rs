use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::ConfigResolver;
use crate::environment::EnvironmentInfo;
use crate::store::Store;

pub fn run(store_path: &Path, name: Option<&str>) -> Result<()> {
    let name = ConfigResolver::new()?.environment(name)?;
    let store = Store::open(store_path)?;
    let info = EnvironmentInfo::resolve(&store, &name)?;

    println!("📦 {}", info.name().as_str().yellow().bold());
    println!(
        "  {} created {}",
        "└".dimmed(),
        info.created_at.to_rfc3339().dimmed()
    );

    let Some(snapshot) = &info.snapshot else {
        println!("  {} {}", "└".dimmed(), "no snapshot recorded".dimmed());
        return Ok(());
    };

    println!(
        "  {} snapshot from {} with {} resources",
        "└".dimmed(),
        snapshot.taken_at.to_rfc3339().dimmed(),
        snapshot.resources.len().to_string().bold()
    );

    for resource in &snapshot.resources {
        let id = resource
            .id
            .as_deref()
            .map(|id| format!(" [{}]", id))
            .unwrap_or_default();
        println!(
            "    {} {} {}{}",
            "•".dimmed(),
            resource.urn.bold(),
            resource.kind.cyan(),
            id.dimmed()
        );
    }

    Ok(())
}
