//! File system layout under `~/.share-mq`.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Name of the base directory under the user's home.
const BASE_DIR_NAME: &str = ".share-mq";
/// SQLite file holding the `share_mq` table.
const DATABASE_FILE_NAME: &str = "share-mq.sqlite";

/// Manages file system paths for share-mq.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.share-mq`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Base directory (~/.share-mq).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Config file (~/.share-mq/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Queue database (~/.share-mq/share-mq.sqlite).
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join(DATABASE_FILE_NAME)
    }

    /// Logs directory (~/.share-mq/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// JSONL log file (~/.share-mq/logs/share-mq.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("share-mq.jsonl")
    }

    /// Root of the per-user trusted certificate directories.
    pub fn certificates_root(&self) -> PathBuf {
        self.base_dir.join("certificates")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.certificates_root())?;
        Ok(())
    }
}
