use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::EngineResult;
use crate::models::ExperienceRecord;
use crate::store::ExperienceStore;

/// In-memory view of the durable experience store.
///
/// Readers clone an `Arc` snapshot under a brief read lock and then compute
/// lock-free; every scan sees a complete, consistent set of records as of
/// some point no older than the last successful append. Appends persist to
/// the store first (no lock held) and only then publish a new snapshot, so
/// the cache never holds a record the store lacks.
pub struct ExperiencePool {
    store: Arc<dyn ExperienceStore>,
    snapshot: RwLock<Arc<Vec<ExperienceRecord>>>,
    next_seq: AtomicU64,
    retention_days: i64,
}

/// Aggregate counts over the current snapshot, for logging and monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub total: usize,
    pub taken: usize,
    pub skipped: usize,
    pub wins: usize,
    pub win_rate: f64,
}

impl ExperiencePool {
    pub fn new(store: Arc<dyn ExperienceStore>, retention_days: i64) -> Self {
        Self {
            store,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            next_seq: AtomicU64::new(1),
            retention_days,
        }
    }

    /// Bulk-load from the durable store. An unreachable store degrades to an
    /// empty pool — the engine keeps answering, with "no data" verdicts —
    /// rather than failing the process.
    pub async fn load(&self) {
        let mut records = match self.store.load_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!("experience store unavailable, starting with empty pool: {e}");
                Vec::new()
            }
        };

        let horizon = Utc::now() - Duration::days(self.retention_days);
        let before = records.len();
        records.retain(|r| r.signal_time >= horizon);
        if records.len() < before {
            debug!("pruned {} records past retention horizon", before - records.len());
        }
        records.sort_by_key(|r| r.signal_time);

        let max_seq = records.iter().map(|r| r.seq).max().unwrap_or(0);
        self.next_seq.store(max_seq + 1, Ordering::SeqCst);

        info!("experience pool loaded: {} records", records.len());
        *self.snapshot.write().await = Arc::new(records);
    }

    /// Validate, persist, then publish. The sequence id is unique and
    /// monotone even under concurrent appends; on a persistence failure
    /// nothing is published and the error surfaces to the caller.
    pub async fn append(&self, mut record: ExperienceRecord) -> EngineResult<u64> {
        record.validate()?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        record.seq = seq;

        // External blocking call; deliberately outside the snapshot lock.
        self.store.insert(&record).await?;

        let horizon = Utc::now() - Duration::days(self.retention_days);
        let mut guard = self.snapshot.write().await;
        let mut next: Vec<ExperienceRecord> = guard
            .iter()
            .filter(|r| r.signal_time >= horizon)
            .cloned()
            .collect();
        next.push(record);
        *guard = Arc::new(next);
        Ok(seq)
    }

    /// Stable snapshot of the current pool.
    pub async fn snapshot(&self) -> Arc<Vec<ExperienceRecord>> {
        self.snapshot.read().await.clone()
    }

    /// Lazy, restartable scan over a consistent snapshot. Concurrent scans
    /// each hold their own snapshot and never block appenders.
    pub async fn scan<P>(&self, predicate: P) -> impl Iterator<Item = ExperienceRecord>
    where
        P: Fn(&ExperienceRecord) -> bool,
    {
        let snap = self.snapshot().await;
        (0..snap.len()).filter_map(move |i| {
            let record = &snap[i];
            predicate(record).then(|| record.clone())
        })
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> PoolStats {
        let snap = self.snapshot().await;
        let total = snap.len();
        let taken = snap.iter().filter(|r| r.took_trade).count();
        let wins = snap.iter().filter(|r| r.is_win()).count();
        PoolStats {
            total,
            taken,
            skipped: total - taken,
            wins,
            win_rate: if taken > 0 {
                wins as f64 / taken as f64
            } else {
                0.0
            },
        }
    }
}
