use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::errors::{EngineError, EngineResult};
use crate::models::ExperienceRecord;
use crate::store::ExperienceStore;

/// In-memory store for storeless runs and tests. `fail_writes` lets tests
/// exercise the persistence-error path without a real broken backend.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ExperienceRecord>>,
    fail_writes: AtomicBool,
    fail_loads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ExperienceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ExperienceStore for MemoryStore {
    async fn load_all(&self) -> EngineResult<Vec<ExperienceRecord>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence("store unreachable".into()));
        }
        let records = self
            .records
            .lock()
            .map_err(|_| EngineError::Persistence("store lock poisoned".into()))?;
        Ok(records.clone())
    }

    async fn insert(&self, record: &ExperienceRecord) -> EngineResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence("store rejected write".into()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|_| EngineError::Persistence("store lock poisoned".into()))?;
        records.push(record.clone());
        Ok(())
    }
}
