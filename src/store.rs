//! SQLite-based environment store
//!
//! Schema design:
//! - environments: one row per environment (name, created_at)
//! - snapshots: the latest resource snapshot of an environment, resources as JSON
//! - metadata: store-level config (schema version)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::environment::{EnvName, EnvironmentInfo, Snapshot, SnapshotError, Target};

const SCHEMA_VERSION: i32 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Load and delete access to persisted environments.
///
/// Implementations must make `remove_target` atomic: either every record of
/// the target is gone afterwards or none is. Callers that resolve and then
/// remove are not serialized against each other; a store shared between
/// processes is responsible for its own locking.
pub trait EnvironmentStore {
    fn load_environment(&self, name: &EnvName) -> Result<Option<EnvironmentInfo>, StoreError>;

    /// Delete all persisted records of `target`. Returns `false` when there
    /// was nothing left to delete.
    fn remove_target(&self, target: &Target) -> Result<bool, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("environment '{0}' already exists")]
    AlreadyExists(EnvName),
    #[error("environment '{0}' not found")]
    NotFound(EnvName),
    #[error("invalid environment name '{0}' in store")]
    BadName(String),
    #[error("invalid timestamp '{0}' in store")]
    BadTimestamp(String),
    #[error("stored snapshot for '{name}' is corrupt")]
    CorruptSnapshot {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot rejected")]
    InvalidSnapshot(#[from] SnapshotError),
    #[error("failed to serialize snapshot")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Row of `tinyenvs env ls`
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSummary {
    pub name: EnvName,
    pub created_at: DateTime<Utc>,
    /// `None` when the environment has no snapshot
    pub resource_count: Option<usize>,
}

/// The environment store
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Get the default store path (~/.tinyenvs/store.db)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tinyenvs").join("store.db"))
    }

    /// Create a new, empty store at `path`
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() {
            anyhow::bail!(
                "Store already exists at {}. Use `tinyenvs env` commands to interact with it.",
                path.display()
            );
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = connect(path).context("Failed to create SQLite database")?;

        conn.execute_batch(include_str!("schema.sql"))
            .context("Failed to initialize database schema")?;
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        tracing::info!(path = %path.display(), "initialized store");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open an existing store
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "No store found at {}. Run `tinyenvs init` first to create one.",
                path.display()
            );
        }

        let conn = connect(path).context("Failed to open SQLite database")?;

        let version: String = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .context("Store appears corrupted - no schema version found")?;

        if version != SCHEMA_VERSION.to_string() {
            anyhow::bail!(
                "Store schema version {} is not supported (expected {})",
                version,
                SCHEMA_VERSION
            );
        }

        tracing::debug!(path = %path.display(), "opened store");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Check if a store exists at `path`
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an environment with no snapshot
    pub fn create_environment(&self, name: &EnvName) -> Result<Target, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO environments (name, created_at) VALUES (?1, ?2)",
            params![name.as_str(), Utc::now().to_rfc3339()],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(name.clone()));
        }

        tracing::info!(environment = %name, "created environment");
        Ok(Target::new(name.clone()))
    }

    /// List all environments, ordered by name
    pub fn list_environments(&self) -> Result<Vec<EnvironmentSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT e.name, e.created_at, json_array_length(s.resources)
             FROM environments e
             LEFT JOIN snapshots s ON s.environment = e.name
             ORDER BY e.name",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, created_at, count)| -> Result<EnvironmentSummary, StoreError> {
                Ok(EnvironmentSummary {
                    name: EnvName::parse(&name).map_err(|_| StoreError::BadName(name.clone()))?,
                    created_at: parse_timestamp(&created_at)?,
                    resource_count: count.map(|c| c.max(0) as usize),
                })
            })
            .collect()
    }

    /// Record `snapshot` as the current snapshot of `target`, replacing any previous one
    pub fn save_snapshot(&self, target: &Target, snapshot: &Snapshot) -> Result<(), StoreError> {
        snapshot.verify()?;
        let resources = serde_json::to_string(&snapshot.resources)?;

        let tx = self.conn.unchecked_transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM environments WHERE name = ?1",
                params![target.name().as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(target.name().clone()));
        }

        tx.execute(
            "INSERT INTO snapshots (environment, taken_at, resources) VALUES (?1, ?2, ?3)
             ON CONFLICT(environment) DO UPDATE SET
                 taken_at = excluded.taken_at,
                 resources = excluded.resources",
            params![
                target.name().as_str(),
                snapshot.taken_at.to_rfc3339(),
                resources
            ],
        )?;

        tx.commit()?;

        tracing::info!(
            environment = %target,
            resources = snapshot.resources.len(),
            "recorded snapshot"
        );
        Ok(())
    }
}

impl EnvironmentStore for Store {
    fn load_environment(&self, name: &EnvName) -> Result<Option<EnvironmentInfo>, StoreError> {
        let row: Option<(String, Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT e.created_at, s.taken_at, s.resources
                 FROM environments e
                 LEFT JOIN snapshots s ON s.environment = e.name
                 WHERE e.name = ?1",
                params![name.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((created_at, taken_at, resources)) = row else {
            return Ok(None);
        };

        let snapshot = match (taken_at, resources) {
            (Some(taken_at), Some(resources)) => Some(Snapshot {
                taken_at: parse_timestamp(&taken_at)?,
                resources: serde_json::from_str(&resources).map_err(|source| {
                    StoreError::CorruptSnapshot {
                        name: name.to_string(),
                        source,
                    }
                })?,
            }),
            _ => None,
        };

        Ok(Some(EnvironmentInfo {
            target: Target::new(name.clone()),
            created_at: parse_timestamp(&created_at)?,
            snapshot,
        }))
    }

    fn remove_target(&self, target: &Target) -> Result<bool, StoreError> {
        let name = target.name().as_str();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM snapshots WHERE environment = ?1", params![name])?;
        let deleted = tx.execute("DELETE FROM environments WHERE name = ?1", params![name])?;

        tx.commit()?;

        if deleted > 0 {
            tracing::info!(environment = %target, "removed environment records");
        } else {
            tracing::debug!(environment = %target, "nothing to remove");
        }
        Ok(deleted > 0)
    }
}

fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::BadTimestamp(value.to_string()))
}

/// In-memory store for exercising code that only needs `EnvironmentStore`
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct MemoryStore {
        envs: RefCell<BTreeMap<String, (DateTime<Utc>, Option<Snapshot>)>>,
        loads: Cell<usize>,
        removes: Cell<usize>,
        fail_removes: Cell<bool>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add(&self, name: &str, snapshot: Option<Snapshot>) {
            self.envs
                .borrow_mut()
                .insert(name.to_string(), (Utc::now(), snapshot));
        }

        pub fn contains(&self, name: &str) -> bool {
            self.envs.borrow().contains_key(name)
        }

        pub fn loads(&self) -> usize {
            self.loads.get()
        }

        pub fn removes(&self) -> usize {
            self.removes.get()
        }

        /// Make every following `remove_target` fail
        pub fn fail_removes(&self) {
            self.fail_removes.set(true);
        }
    }

    impl EnvironmentStore for MemoryStore {
        fn load_environment(
            &self,
            name: &EnvName,
        ) -> Result<Option<EnvironmentInfo>, StoreError> {
            self.loads.set(self.loads.get() + 1);
            Ok(self
                .envs
                .borrow()
                .get(name.as_str())
                .map(|(created_at, snapshot)| EnvironmentInfo {
                    target: Target::new(name.clone()),
                    created_at: *created_at,
                    snapshot: snapshot.clone(),
                }))
        }

        fn remove_target(&self, target: &Target) -> Result<bool, StoreError> {
            self.removes.set(self.removes.get() + 1);
            if self.fail_removes.get() {
                return Err(StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
                    Some("attempt to write a readonly database".to_string()),
                )));
            }
            Ok(self
                .envs
                .borrow_mut()
                .remove(target.name().as_str())
                .is_some())
        }
    }
}
