use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::errors::{EngineError, EngineResult};
use crate::models::ExperienceRecord;
use crate::store::ExperienceStore;

/// Append-only JSON-lines store: one experience record per line. Simple to
/// rebuild the pool from and append-safe under a single writer lock.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes appends so two writers never interleave half-lines.
    write_guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| EngineError::Persistence(format!("create {dir:?}: {e}")))?;
        }
        Ok(Self {
            path,
            write_guard: Mutex::new(()),
        })
    }
}

#[async_trait]
impl ExperienceStore for JsonFileStore {
    async fn load_all(&self) -> EngineResult<Vec<ExperienceRecord>> {
        if !self.path.exists() {
            info!("experience store {:?} not found, starting empty", self.path);
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| EngineError::Persistence(format!("read {:?}: {e}", self.path)))?;

        let mut records = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ExperienceRecord>(line) {
                Ok(r) => records.push(r),
                Err(e) => warn!("skipping corrupt record at line {}: {}", i + 1, e),
            }
        }
        info!("loaded {} experience records from {:?}", records.len(), self.path);
        Ok(records)
    }

    async fn insert(&self, record: &ExperienceRecord) -> EngineResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| EngineError::Persistence(format!("serialize record: {e}")))?;

        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| EngineError::Persistence("store writer lock poisoned".into()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EngineError::Persistence(format!("open {:?}: {e}", self.path)))?;
        writeln!(file, "{line}")
            .map_err(|e| EngineError::Persistence(format!("append {:?}: {e}", self.path)))?;
        file.flush()
            .map_err(|e| EngineError::Persistence(format!("flush {:?}: {e}", self.path)))?;
        Ok(())
    }
}
