use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;
use warden_core::{Acquisition, IdempotencyStore, IdempotencyStoreError, LockState};

/// Process-local idempotency store. Suitable for a single instance or for tests.
#[derive(Default, Clone)]
pub struct HashMapIdempotencyStore {
    entries: Arc<DashMap<String, (LockState, Instant)>>,
}

impl HashMapIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &str) -> Option<LockState> {
        self.entries
            .get(key)
            .filter(|entry| entry.1 > Instant::now())
            .map(|entry| entry.0)
    }
}

#[async_trait::async_trait]
impl IdempotencyStore for HashMapIdempotencyStore {
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Acquisition, IdempotencyStoreError> {
        let now = Instant::now();

        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => {
                let (state, expires_at) = *entry.get();
                if expires_at > now {
                    return Ok(Acquisition::Held(state));
                }
                entry.insert((LockState::Processing, now + ttl));
            }
            Entry::Vacant(entry) => {
                entry.insert((LockState::Processing, now + ttl));
            }
        }

        Ok(Acquisition::Acquired)
    }

    async fn mark_done(&self, key: &str, ttl: Duration) -> Result<(), IdempotencyStoreError> {
        self.entries
            .insert(key.to_owned(), (LockState::Done, Instant::now() + ttl));
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), IdempotencyStoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
