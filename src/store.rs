//! Save action. The record is built from the accumulated buffer and handed
//! to a [`PassageStore`]; the default store only logs it.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{StoreConfig, StoreKind};
use crate::parsing::partition;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub user_id: u64,
    pub passage: String,
    pub definitions: Option<String>,
}

impl SaveRecord {
    /// Re-partitions `buffer` exactly as the results view does.
    pub fn from_buffer(buffer: &str, user_id: u64) -> Self {
        let parsed = partition(buffer);
        Self {
            user_id,
            passage: parsed.passage,
            definitions: parsed.vocabulary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAck {
    pub destination: String,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait PassageStore: Send + Sync {
    fn save(&self, record: &SaveRecord) -> Result<SaveAck, SaveError>;
}

/// Logs the record and reports success.
#[derive(Debug, Default)]
pub struct LogStore;

impl PassageStore for LogStore {
    fn save(&self, record: &SaveRecord) -> Result<SaveAck, SaveError> {
        log::info!("Saving passage: {}", serde_json::to_string(record)?);
        Ok(SaveAck {
            destination: "log".to_string(),
        })
    }
}

/// Appends one JSON object per line.
#[derive(Debug)]
pub struct JsonlFileStore {
    path: PathBuf,
}

impl JsonlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SaveError {
        SaveError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PassageStore for JsonlFileStore {
    fn save(&self, record: &SaveRecord) -> Result<SaveAck, SaveError> {
        let line = serde_json::to_string(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", line).map_err(|e| self.io_err(e))?;
        writer.flush().map_err(|e| self.io_err(e))?;

        log::info!("Saved passage for user {} to {}", record.user_id, self.path.display());
        Ok(SaveAck {
            destination: self.path.display().to_string(),
        })
    }
}

pub fn build_store(config: &StoreConfig) -> Box<dyn PassageStore> {
    match config.kind {
        StoreKind::Log => Box::new(LogStore),
        StoreKind::Jsonl => Box::new(JsonlFileStore::new(config.path.clone())),
    }
}
