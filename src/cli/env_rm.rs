use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::cli::confirm_removal;
use crate::config::Config;
use crate::environment::Target;
use crate::removal::{remove_environment, RemoveError};
use crate::store::{EnvironmentStore, Store};

#[derive(Debug)]
pub enum Outcome {
    Removed {
        target: Target,
        /// Config file whose selection pointed at the removed environment
        deselected: Option<PathBuf>,
    },
    Declined,
}

/// The `env rm` flow with the confirmation prompt passed in.
///
/// `confirm` is skipped entirely when `yes` is set. The resources check
/// applies either way. The selection in the config found from `cwd` is
/// cleared only once the store delete has succeeded.
pub fn execute<S, F>(
    store: &S,
    cwd: &Path,
    name: &str,
    force: bool,
    yes: bool,
    confirm: F,
) -> Result<Outcome, RemoveError>
where
    S: EnvironmentStore + ?Sized,
    F: FnOnce(&str) -> bool,
{
    if name.is_empty() {
        return Err(RemoveError::MissingName);
    }

    if !yes && !confirm(name) {
        return Ok(Outcome::Declined);
    }

    let target = remove_environment(store, name, force)?;
    let deselected = clear_selection(cwd, &target);

    Ok(Outcome::Removed { target, deselected })
}

/// A failure here leaves a stale selection but does not undo the removal.
fn clear_selection(cwd: &Path, target: &Target) -> Option<PathBuf> {
    match Config::deselect_in(cwd, target.name().as_str()) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "failed to clear environment selection");
            eprintln!("{} Could not clear selection: {}", "⚠".yellow(), e);
            None
        }
    }
}

pub fn run(store_path: &Path, name: Option<&str>, force: bool, yes: bool) -> Result<()> {
    // Checked here too so a missing name never opens the store
    let name = name.unwrap_or_default();
    if name.is_empty() {
        return Err(RemoveError::MissingName.into());
    }

    let store = Store::open(store_path)?;
    let cwd = std::env::current_dir()?;

    let (target, deselected) = match execute(&store, &cwd, name, force, yes, confirm_removal)? {
        Outcome::Removed { target, deselected } => (target, deselected),
        Outcome::Declined => {
            eprintln!("{} Removal cancelled", "○".yellow());
            return Ok(());
        }
    };

    eprintln!(
        "{} Removed environment {}",
        "✓".green(),
        target.name().as_str().yellow()
    );
    if let Some(path) = deselected {
        eprintln!(
            "  {} cleared selection in {}",
            "└".dimmed(),
            path.display().to_string().cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use crate::environment::{Resource, Snapshot};
    use crate::store::testing::MemoryStore;
    use std::cell::Cell;

    fn selected_in(dir: &Path) -> Option<String> {
        Config::load_from(dir)
            .unwrap()
            .and_then(|(config, _)| config.environment)
    }

    fn with_resources() -> Option<Snapshot> {
        Some(Snapshot::new(vec![Resource {
            urn: "urn:tinyenvs:staging::aws:s3/bucket:Bucket::assets".into(),
            kind: "aws:s3/bucket:Bucket".into(),
            id: None,
            dependencies: vec![],
        }]))
    }

    #[test]
    fn declining_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("dev", None);

        let outcome = execute(&store, dir.path(), "dev", false, false, |_| false).unwrap();
        assert!(matches!(outcome, Outcome::Declined));
        assert!(store.contains("dev"));
        assert_eq!(store.loads(), 0);
    }

    #[test]
    fn confirmation_receives_environment_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("dev", None);

        let outcome =
            execute(&store, dir.path(), "dev", false, false, |name| name == "dev").unwrap();
        assert!(matches!(
            outcome,
            Outcome::Removed { target: ref t, .. } if t.name().as_str() == "dev"
        ));
        assert!(!store.contains("dev"));
    }

    #[test]
    fn yes_skips_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("dev", None);
        let asked = Cell::new(false);

        execute(&store, dir.path(), "dev", false, true, |_| {
            asked.set(true);
            false
        })
        .unwrap();
        assert!(!asked.get());
        assert!(!store.contains("dev"));
    }

    #[test]
    fn yes_still_respects_resources_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("staging", with_resources());

        let err = execute(&store, dir.path(), "staging", false, true, |_| true).unwrap_err();
        assert!(matches!(err, RemoveError::HasResources(_)));
        assert!(store.contains("staging"));

        execute(&store, dir.path(), "staging", true, true, |_| true).unwrap();
        assert!(!store.contains("staging"));
    }

    #[test]
    fn empty_name_fails_before_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let asked = Cell::new(false);

        let err = execute(&store, dir.path(), "", true, false, |_| {
            asked.set(true);
            true
        })
        .unwrap_err();
        assert!(matches!(err, RemoveError::MissingName));
        assert!(!asked.get());
    }

    #[test]
    fn removing_selected_environment_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("staging", None);
        Config::select_in(dir.path(), "staging").unwrap();

        let outcome = execute(&store, dir.path(), "staging", false, true, |_| true).unwrap();
        let Outcome::Removed { deselected, .. } = outcome else {
            panic!("expected the environment to be removed");
        };
        assert_eq!(deselected, Some(dir.path().join(CONFIG_FILE)));

        assert_eq!(selected_in(dir.path()), None);
    }

    #[test]
    fn removing_other_environment_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("dev", None);
        store.add("staging", None);
        Config::select_in(dir.path(), "staging").unwrap();

        let outcome = execute(&store, dir.path(), "dev", false, true, |_| true).unwrap();
        assert!(matches!(outcome, Outcome::Removed { deselected: None, .. }));
        assert_eq!(selected_in(dir.path()).as_deref(), Some("staging"));
    }

    #[test]
    fn selection_survives_failed_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("staging", None);
        store.fail_removes();
        Config::select_in(dir.path(), "staging").unwrap();

        let err = execute(&store, dir.path(), "staging", false, true, |_| true).unwrap_err();
        assert!(matches!(err, RemoveError::Delete(_)));
        assert_eq!(selected_in(dir.path()).as_deref(), Some("staging"));
    }

    #[test]
    fn selection_survives_rejection_and_decline() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.add("staging", with_resources());
        Config::select_in(dir.path(), "staging").unwrap();

        let err = execute(&store, dir.path(), "staging", false, true, |_| true).unwrap_err();
        assert!(matches!(err, RemoveError::HasResources(_)));
        assert_eq!(selected_in(dir.path()).as_deref(), Some("staging"));

        let outcome = execute(&store, dir.path(), "staging", true, false, |_| false).unwrap();
        assert!(matches!(outcome, Outcome::Declined));
        assert_eq!(selected_in(dir.path()).as_deref(), Some("staging"));
    }

    #[test]
    fn run_requires_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("store.db"), None, false, true).unwrap_err();
        assert_eq!(err.to_string(), "missing required environment name");
    }
}
