use async_trait::async_trait;
use kvdb_core::{persistence::PersistenceLayer, KvError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Snapshot stored in a single file on disk.
///
/// Every save writes the full snapshot to `<path>.tmp`, optionally fsyncs
/// it, and renames it over `<path>`. A crash mid-write therefore leaves the
/// previous complete snapshot in place.
#[derive(Debug, Clone)]
pub struct FileSystemPersistence {
    state_file_path: PathBuf,
    temp_file_path: PathBuf,
    sync_on_write: bool,
}

impl FileSystemPersistence {
    /// Create a file-backed persistence instance.
    ///
    /// # Arguments
    /// * `state_file` - Path of the snapshot file, e.g. `kv.db`
    ///
    /// # Errors
    /// * Returns error if the parent directory cannot be created
    pub async fn new<P: AsRef<Path>>(state_file: P) -> Result<Self> {
        let state_file_path = state_file.as_ref().to_path_buf();

        if let Some(parent) = state_file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    KvError::persistence(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        let mut temp_name = OsString::from(state_file_path.as_os_str());
        temp_name.push(".tmp");

        Ok(Self {
            state_file_path,
            temp_file_path: PathBuf::from(temp_name),
            sync_on_write: true,
        })
    }

    /// Whether each save is fsynced before the rename.
    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    pub fn path(&self) -> &Path {
        &self.state_file_path
    }
}

#[async_trait]
impl PersistenceLayer for FileSystemPersistence {
    async fn save_state(&self, state: &[u8]) -> Result<()> {
        let mut file = fs::File::create(&self.temp_file_path).await.map_err(|e| {
            KvError::persistence(format!("Failed to create temp snapshot file: {}", e))
        })?;

        file.write_all(state).await.map_err(|e| {
            KvError::persistence(format!("Failed to write snapshot to temp file: {}", e))
        })?;

        if self.sync_on_write {
            file.sync_all()
                .await
                .map_err(|e| KvError::persistence(format!("Failed to sync temp file: {}", e)))?;
        } else {
            file.flush()
                .await
                .map_err(|e| KvError::persistence(format!("Failed to flush temp file: {}", e)))?;
        }
        drop(file);

        // Atomically replace the old snapshot with the new one
        fs::rename(&self.temp_file_path, &self.state_file_path)
            .await
            .map_err(|e| {
                KvError::persistence(format!("Failed to rename temp file to snapshot: {}", e))
            })?;

        debug!(
            "Snapshot written to {} ({} bytes)",
            self.state_file_path.display(),
            state.len()
        );
        Ok(())
    }

    async fn load_state(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.state_file_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KvError::persistence(format!(
                "Failed to read snapshot file {}: {}",
                self.state_file_path.display(),
                e
            ))),
        }
    }
}
