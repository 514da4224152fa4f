//! Scan history view model
//!
//! Holds the current identity's scan records, newest first. Sorting happens
//! here rather than in the repository so no compound index is needed.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::data::{RepositoryError, ScanRecord, ScanRepository};
use crate::identity::UserId;

#[derive(Debug, Default)]
struct HistoryState {
    records: Vec<ScanRecord>,
    loading: bool,
    /// Bumped by every load and clear; a load only applies if it is still current
    generation: u64,
}

/// Sort newest first. Records without a timestamp sort as oldest; ties keep their order.
pub fn sort_newest_first(records: &mut [ScanRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[derive(Clone)]
pub struct HistoryViewModel {
    scans: Arc<dyn ScanRepository>,
    state: Arc<RwLock<HistoryState>>,
}

impl HistoryViewModel {
    pub fn new(scans: Arc<dyn ScanRepository>) -> Self {
        Self {
            scans,
            state: Arc::new(RwLock::new(HistoryState::default())),
        }
    }

    /// Replace the list with `user`'s records. On failure the previous list is kept.
    ///
    /// A load overtaken by a later load or [`clear`](Self::clear) leaves the
    /// list alone and returns the current length.
    pub async fn load(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let generation = {
            let mut state = self.state.write();
            state.generation += 1;
            state.loading = true;
            state.generation
        };
        let fetched = self.scans.query_by_user(user).await;

        let mut state = self.state.write();
        if state.generation != generation {
            tracing::debug!(user = %user, "Discarding superseded history load");
            return fetched.map(|_| state.records.len());
        }
        state.loading = false;
        let mut records = fetched.map_err(|e| {
            tracing::warn!(user = %user, error = %e, "Failed to load scan history");
            e
        })?;
        sort_newest_first(&mut records);
        state.records = records;
        Ok(state.records.len())
    }

    /// Delete a record from the repository, then from the list.
    /// The caller is responsible for asking the user first.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.scans.delete(id).await?;
        self.state.write().records.retain(|record| record.id != id);
        tracing::debug!(scan = %id, "Scan record deleted");
        Ok(())
    }

    pub fn records(&self) -> Vec<ScanRecord> {
        self.state.read().records.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<ScanRecord> {
        self.state.read().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Drop all records, e.g. on sign-out
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.generation += 1;
        state.loading = false;
        state.records.clear();
    }
}
