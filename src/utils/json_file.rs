//! Whole-file JSON persistence
//!
//! State files are always read and written as a unit. Writes land in a
//! temporary file next to the target and are renamed over it, so a crash
//! mid-write never leaves a truncated file behind.

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::{RepositoryError, RepositoryResult};

/// Read `path` as JSON, treating a missing or blank file as `T::default()`.
pub async fn read_json_or_default<T>(path: &Path) -> RepositoryResult<T>
where
    T: DeserializeOwned + Default,
{
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("State file {} does not exist yet", path.display());
            return Ok(T::default());
        }
        Err(e) => return Err(RepositoryError::io(path, e)),
    };

    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&contents)?)
}

/// Serialize `value` and atomically replace `path` with it.
pub async fn write_json_atomically<T>(path: &Path, value: &T) -> RepositoryResult<()>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(value)?;
    let target = path.to_path_buf();

    tokio::task::spawn_blocking(move || write_bytes_atomically(&target, &bytes))
        .await
        .map_err(|e| RepositoryError::persist_failed(path, e.to_string()))?
}

fn write_bytes_atomically(path: &Path, bytes: &[u8]) -> RepositoryResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| RepositoryError::io(&dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| RepositoryError::io(&dir, e))?;
    tmp.write_all(bytes).map_err(|e| RepositoryError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| RepositoryError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| RepositoryError::persist_failed(path, e.error.to_string()))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
