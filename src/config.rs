//! Local project configuration for tinyenvs
//!
//! Reads `.tinyenvs.toml` from the current directory (or the nearest
//! ancestor that has one) to remember the selected environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".tinyenvs.toml";

/// Local project configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Currently selected environment
    pub environment: Option<String>,
}

impl Config {
    /// Find and load config from current directory or ancestors
    pub fn load() -> Result<Option<(Self, PathBuf)>> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::load_from(&cwd)
    }

    /// Find and load config starting at `dir` and walking up
    pub fn load_from(dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        match Self::find_config_file(dir) {
            Some(p) => {
                let contents = std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read {}", p.display()))?;
                let config: Config = toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", p.display()))?;
                Ok(Some((config, p)))
            }
            None => Ok(None),
        }
    }

    fn find_config_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start;

        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => return None,
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Select `environment`, updating the nearest config file or creating
    /// one in `dir`
    pub fn select_in(dir: &Path, environment: &str) -> Result<PathBuf> {
        let (mut config, path) = Self::load_from(dir)?
            .unwrap_or_else(|| (Config::default(), dir.join(CONFIG_FILE)));
        config.environment = Some(environment.to_string());
        config.save_to(&path)?;
        Ok(path)
    }

    /// Clear the selection if it points at `environment`.
    ///
    /// Returns the updated file, or `None` when nothing was selected or a
    /// different environment was.
    pub fn deselect_in(dir: &Path, environment: &str) -> Result<Option<PathBuf>> {
        let Some((mut config, path)) = Self::load_from(dir)? else {
            return Ok(None);
        };
        if config.environment.as_deref() != Some(environment) {
            return Ok(None);
        }
        config.environment = None;
        config.save_to(&path)?;
        Ok(Some(path))
    }
}

/// Helper to resolve the environment from CLI args or config
pub struct ConfigResolver {
    config: Option<Config>,
}

impl ConfigResolver {
    pub fn new() -> Result<Self> {
        let config = Config::load()?.map(|(config, _)| config);
        Ok(Self { config })
    }

    /// Resolve environment: use CLI arg if provided, otherwise config
    pub fn environment(&self, cli_arg: Option<&str>) -> Result<String> {
        match cli_arg {
            Some(e) => Ok(e.to_string()),
            None => self
                .config
                .as_ref()
                .and_then(|c| c.environment.clone())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "No environment specified. Pass one or select it with `tinyenvs env select <name>`"
                    )
                }),
        }
    }

    /// Currently selected environment, if any
    pub fn selected(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.environment.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_creates_config_and_load_finds_it_from_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("a").join("b");
        std::fs::create_dir_all(&sub).unwrap();

        let path = Config::select_in(dir.path(), "staging").unwrap();
        assert_eq!(path, dir.path().join(CONFIG_FILE));

        let (config, found) = Config::load_from(&sub).unwrap().unwrap();
        assert_eq!(config.environment.as_deref(), Some("staging"));
        assert_eq!(found, path);
    }

    #[test]
    fn select_updates_nearest_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir_all(&sub).unwrap();
        Config::select_in(dir.path(), "dev").unwrap();

        let path = Config::select_in(&sub, "prod").unwrap();
        assert_eq!(path, dir.path().join(CONFIG_FILE));
        assert!(!sub.join(CONFIG_FILE).exists());
    }

    #[test]
    fn deselect_only_clears_matching_environment() {
        let dir = tempfile::tempdir().unwrap();
        Config::select_in(dir.path(), "staging").unwrap();

        assert_eq!(Config::deselect_in(dir.path(), "dev").unwrap(), None);
        let (config, _) = Config::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(config.environment.as_deref(), Some("staging"));

        assert!(Config::deselect_in(dir.path(), "staging").unwrap().is_some());
        let (config, _) = Config::load_from(dir.path()).unwrap().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn resolver_prefers_cli_argument() {
        let resolver = ConfigResolver {
            config: Some(Config {
                environment: Some("dev".into()),
            }),
        };
        assert_eq!(resolver.environment(Some("prod")).unwrap(), "prod");
        assert_eq!(resolver.environment(None).unwrap(), "dev");

        let empty = ConfigResolver { config: None };
        assert!(empty.environment(None).is_err());
        assert_eq!(empty.selected(), None);
    }
}
