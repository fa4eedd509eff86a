//! Environment removal policy
//!
//! Removing an environment only deletes its records. It never touches the
//! infrastructure a snapshot describes, so an environment that still tracks
//! resources is only removed when the caller forces it.

use crate::environment::{EnvName, EnvironmentInfo, ResolveError, Target};
use crate::store::{EnvironmentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RemoveError {
    #[error("missing required environment name")]
    MissingName,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("'{0}' still has resources; removal rejected; pass --force to override")]
    HasResources(EnvName),
    #[error(transparent)]
    Delete(StoreError),
}

/// Resolve `name` and delete its records from `store`.
///
/// Fails with [`RemoveError::HasResources`] when the environment's snapshot
/// lists at least one resource and `force` is false. An empty name fails
/// before the store is consulted. Returns the removed target.
pub fn remove_environment<S>(store: &S, name: &str, force: bool) -> Result<Target, RemoveError>
where
    S: EnvironmentStore + ?Sized,
{
    if name.is_empty() {
        return Err(RemoveError::MissingName);
    }

    let info = EnvironmentInfo::resolve(store, name)?;

    if !force && info.has_resources() {
        tracing::warn!(
            environment = %info.name(),
            resources = info.resource_count(),
            "removal rejected, environment still has resources"
        );
        return Err(RemoveError::HasResources(info.name().clone()));
    }

    store.remove_target(&info.target).map_err(RemoveError::Delete)?;

    tracing::info!(
        environment = %info.name(),
        forced = force,
        orphaned_resources = info.resource_count(),
        "removed environment"
    );

    Ok(info.target)
}
