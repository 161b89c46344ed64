//! Persistence sink for sequenced events and table snapshots.
//!
//! The table actor writes through this trait from a separate task so a slow
//! backend never stalls the table.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tokio::sync::RwLock;

use super::{
    config::TableId,
    sequencer::{Sequenced, TableSnapshot},
};
use crate::game::events::Notification;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("table {0} not found")]
    TableNotFound(TableId),
    #[error("event {seq} is out of order for table {table_id}")]
    OutOfOrder { table_id: TableId, seq: u64 },
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Trait for table event and snapshot storage
#[async_trait]
pub trait TableRepository: Send + Sync {
    /// Append one sequenced event
    async fn append_event(
        &self,
        table_id: TableId,
        event: Sequenced<Notification>,
    ) -> RepositoryResult<()>;

    /// Replace the stored snapshot
    async fn save_snapshot(&self, snapshot: TableSnapshot) -> RepositoryResult<()>;

    /// Latest stored snapshot, if any
    async fn load_snapshot(&self, table_id: TableId) -> RepositoryResult<Option<TableSnapshot>>;

    /// Stored events with a sequence number greater than `seq`
    async fn read_events_since(
        &self,
        table_id: TableId,
        seq: u64,
    ) -> RepositoryResult<Vec<Sequenced<Notification>>>;
}

#[derive(Debug, Default)]
struct TableLog {
    events: VecDeque<Sequenced<Notification>>,
    snapshot: Option<TableSnapshot>,
}

/// In-process implementation keeping at most `capacity` events per table.
#[derive(Debug)]
pub struct InMemoryTableRepository {
    capacity: usize,
    tables: RwLock<HashMap<TableId, TableLog>>,
}

impl InMemoryTableRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tables: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TableRepository for InMemoryTableRepository {
    async fn append_event(
        &self,
        table_id: TableId,
        event: Sequenced<Notification>,
    ) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let log = tables.entry(table_id).or_default();
        if log.events.back().is_some_and(|last| last.seq >= event.seq) {
            return Err(RepositoryError::OutOfOrder {
                table_id,
                seq: event.seq,
            });
        }
        if log.events.len() == self.capacity {
            log.events.pop_front();
        }
        log.events.push_back(event);
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: TableSnapshot) -> RepositoryResult<()> {
        let table_id = snapshot.table_id;
        let mut tables = self.tables.write().await;
        tables.entry(table_id).or_default().snapshot = Some(snapshot);
        Ok(())
    }

    async fn load_snapshot(&self, table_id: TableId) -> RepositoryResult<Option<TableSnapshot>> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table_id).and_then(|log| log.snapshot.clone()))
    }

    async fn read_events_since(
        &self,
        table_id: TableId,
        seq: u64,
    ) -> RepositoryResult<Vec<Sequenced<Notification>>> {
        let tables = self.tables.read().await;
        let log = tables
            .get(&table_id)
            .ok_or(RepositoryError::TableNotFound(table_id))?;
        Ok(log
            .events
            .iter()
            .filter(|event| event.seq > seq)
            .cloned()
            .collect())
    }
}
