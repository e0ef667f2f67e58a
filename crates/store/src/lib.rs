mod error;
mod format;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracker_core::UsageRecord;

pub use error::{Result, StoreError};

pub const DEFAULT_STATE_FILE_NAME: &str = "lte_usage_data.json";

/// JSON file holding the single usage record of the tracked device.
#[derive(Debug, Clone)]
pub struct UsageStore {
    path: PathBuf,
}

impl UsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Stored record, or the zero record when nothing was saved yet.
    pub fn load(&self) -> Result<UsageRecord> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file, starting fresh");
                return Ok(UsageRecord::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        format::decode(&contents).map_err(|reason| StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        })
    }

    /// Replaces the stored record. The new contents are written to a
    /// temporary file next to the target and renamed over it, so readers
    /// see either the old or the new record.
    pub fn save(&self, record: &UsageRecord) -> Result<()> {
        self.write_atomic(record).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn write_atomic(&self, record: &UsageRecord) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let contents = format::encode(record).map_err(io::Error::other)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents.as_bytes())?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        tracing::debug!(
            path = %self.path.display(),
            cumulative_usage = record.cumulative_usage_bytes,
            "saved usage record"
        );
        Ok(())
    }
}
