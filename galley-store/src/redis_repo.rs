use crate::StoreError;
use async_trait::async_trait;
use galley_core::{CoreResult, PickupStore, WorkItemStore};
use galley_shared::{FulfillmentStatus, PickupRecord, WorkItemId};
use redis::AsyncCommands;
use tracing::{debug, info};

const PICKUP_INDEX: &str = "pickups";

// Only move a work item forward: retried or reordered writes are no-ops.
const ADVANCE_STATUS: &str = r#"
    local current = tonumber(redis.call("HGET", KEYS[1], "rank") or "-1")
    if tonumber(ARGV[1]) > current then
        redis.call("HSET", KEYS[1], "rank", ARGV[1], "status", ARGV[2])
        return 1
    end
    return 0
"#;

// Insert a pickup record once and index it in arrival order.
const APPEND_PICKUP: &str = r#"
    if redis.call("SET", KEYS[1], ARGV[1], "NX") then
        redis.call("RPUSH", KEYS[2], ARGV[2])
        return 1
    end
    return 0
"#;

fn work_item_key(id: &WorkItemId) -> String {
    format!("workitem:{}", id.storage_key())
}

fn pickup_key(id: &str) -> String {
    format!("pickup:{}", id)
}

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        info!("Redis store configured");
        Ok(Self { client })
    }

    async fn advance_status(&self, id: &WorkItemId, status: FulfillmentStatus) -> Result<bool, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let applied: i32 = redis::Script::new(ADVANCE_STATUS)
            .key(work_item_key(id))
            .arg(status.rank())
            .arg(status.to_string())
            .invoke_async(&mut conn)
            .await?;
        Ok(applied == 1)
    }

    async fn append_pickup(&self, record: &PickupRecord) -> Result<bool, StoreError> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let inserted: i32 = redis::Script::new(APPEND_PICKUP)
            .key(pickup_key(&record.id))
            .key(PICKUP_INDEX)
            .arg(payload)
            .arg(&record.id)
            .invoke_async(&mut conn)
            .await?;
        Ok(inserted == 1)
    }

    async fn read_pickups(&self) -> Result<Vec<PickupRecord>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = conn.lrange(PICKUP_INDEX, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| pickup_key(id)).collect();
        let payloads: Vec<Option<String>> = conn.mget(&keys).await?;

        let mut records = Vec::with_capacity(payloads.len());
        for (key, payload) in keys.iter().zip(payloads) {
            match payload {
                Some(json) => records.push(serde_json::from_str(&json)?),
                None => debug!("Indexed pickup {} has no record", key),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl WorkItemStore for RedisClient {
    async fn put_status(&self, id: &WorkItemId, status: FulfillmentStatus) -> CoreResult<()> {
        let applied = self.advance_status(id, status).await?;
        if !applied {
            debug!(work_item = %id, %status, "Stale status write ignored");
        }
        Ok(())
    }
}

#[async_trait]
impl PickupStore for RedisClient {
    async fn put_pickup(&self, record: &PickupRecord) -> CoreResult<bool> {
        Ok(self.append_pickup(record).await?)
    }

    async fn list_pickups(&self) -> CoreResult<Vec<PickupRecord>> {
        Ok(self.read_pickups().await?)
    }
}
