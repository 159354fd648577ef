use crate::domain::ports::TransactionLog;
use crate::domain::transaction::{PendingTransaction, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe, non-durable transaction log.
///
/// Uses `Arc<RwLock<Vec<TransactionRecord>>>` so clones share the same records.
/// Sequence numbers come from the vector length under the write lock, so they
/// are gapless. Suited to tests and dry runs where nothing must survive a restart.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLog {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl InMemoryTransactionLog {
    /// Creates a new, empty in-memory log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, pending: PendingTransaction) -> Result<TransactionRecord> {
        let mut records = self.records.write().await;
        let record = pending.into_record(records.len() as u64 + 1);
        records.push(record.clone());
        Ok(record)
    }

    async fn read_all(&self) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.clone())
    }
}
