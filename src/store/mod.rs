pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::errors::EngineResult;
use crate::models::ExperienceRecord;

/// The durable experience store the engine treats as the system of record.
/// Both operations are atomic at single-record granularity; the pool cache is
/// rebuildable from `load_all` at any time.
#[async_trait]
pub trait ExperienceStore: Send + Sync {
    async fn load_all(&self) -> EngineResult<Vec<ExperienceRecord>>;
    async fn insert(&self, record: &ExperienceRecord) -> EngineResult<()>;
}
