use std::sync::Arc;
use std::time::Duration;

use redis::{Commands, Connection};
use tokio::sync::RwLock;
use warden_core::{Acquisition, IdempotencyStore, IdempotencyStoreError, LockState};

#[derive(Clone)]
pub struct RedisIdempotencyStore {
    conn: Arc<RwLock<Connection>>,
}

impl RedisIdempotencyStore {
    pub fn new(conn: Arc<RwLock<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    #[tracing::instrument(name = "Acquiring idempotency key in Redis", skip(self))]
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Acquisition, IdempotencyStoreError> {
        let key = get_key(key);
        let mut conn = self.conn.write().await;

        // SET NX answers OK when the key was created and nil when it already existed.
        let created: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(LockState::Processing.as_str())
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query(&mut *conn)
            .map_err(store_error)?;

        if created.is_some() {
            return Ok(Acquisition::Acquired);
        }

        // The holder may have released the key since; treat that as still in flight.
        let current: Option<String> = conn.get(&key).map_err(store_error)?;
        let state = current
            .as_deref()
            .and_then(LockState::parse)
            .unwrap_or(LockState::Processing);

        Ok(Acquisition::Held(state))
    }

    async fn mark_done(&self, key: &str, ttl: Duration) -> Result<(), IdempotencyStoreError> {
        let key = get_key(key);
        let mut conn = self.conn.write().await;
        conn.set_ex(key, LockState::Done.as_str(), ttl_seconds(ttl))
            .map_err(store_error)
    }

    async fn release(&self, key: &str) -> Result<(), IdempotencyStoreError> {
        let key = get_key(key);
        let mut conn = self.conn.write().await;
        conn.del(key).map_err(store_error)
    }
}

const IDEMPOTENCY_KEY_PREFIX: &str = "idempotency:";

fn get_key(key: &str) -> String {
    format!("{}{}", IDEMPOTENCY_KEY_PREFIX, key)
}

// Redis rejects a zero expiry.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn store_error(e: redis::RedisError) -> IdempotencyStoreError {
    IdempotencyStoreError::StoreError(e.to_string())
}
