use async_trait::async_trait;
use galley_core::{CoreResult, PickupStore, WorkItemStore};
use galley_shared::{FulfillmentStatus, PickupRecord, WorkItemId};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct Pickups {
    ids: HashSet<String>,
    records: Vec<PickupRecord>,
}

/// Process-local store, used when no external backend is configured and in tests
#[derive(Default)]
pub struct MemoryStore {
    statuses: RwLock<HashMap<String, FulfillmentStatus>>,
    pickups: RwLock<Pickups>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn status(&self, id: &WorkItemId) -> Option<FulfillmentStatus> {
        self.statuses.read().await.get(&id.storage_key()).copied()
    }
}

#[async_trait]
impl WorkItemStore for MemoryStore {
    /// Stale writes (a lower status than the stored one) are ignored
    async fn put_status(&self, id: &WorkItemId, status: FulfillmentStatus) -> CoreResult<()> {
        let mut statuses = self.statuses.write().await;
        let current = statuses.entry(id.storage_key()).or_insert(status);
        if status.rank() > current.rank() {
            *current = status;
        }
        Ok(())
    }
}

#[async_trait]
impl PickupStore for MemoryStore {
    async fn put_pickup(&self, record: &PickupRecord) -> CoreResult<bool> {
        let mut pickups = self.pickups.write().await;
        if !pickups.ids.insert(record.id.clone()) {
            return Ok(false);
        }
        pickups.records.push(record.clone());
        Ok(true)
    }

    async fn list_pickups(&self) -> CoreResult<Vec<PickupRecord>> {
        Ok(self.pickups.read().await.records.clone())
    }
}
