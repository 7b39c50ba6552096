use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use warden_core::{Acquisition, IdempotencyStore, IdempotencyStoreError, LockState};

pub const DEFAULT_PROCESSING_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_DONE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// What happened to a guarded operation.
#[derive(Debug, PartialEq, Eq)]
pub enum IdempotencyOutcome<T> {
    /// This call acquired the key and ran the operation.
    Executed(T),
    /// Another caller holds the key and may still be running.
    InProgress,
    /// The operation already completed for this key.
    AlreadyDone,
}

impl<T> IdempotencyOutcome<T> {
    pub fn was_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }
}

#[derive(Debug, Error)]
pub enum IdempotencyError<E> {
    #[error("{0}")]
    Store(#[from] IdempotencyStoreError),
    #[error("Guarded operation failed: {0}")]
    Operation(E),
}

/// Runs an operation at most once per key across concurrent callers and restarts.
///
/// The key is claimed with a set-if-absent in `processing` state. A failed operation
/// releases the key so it can be retried; a successful one flips it to `done` with a
/// longer expiry so replays inside that window are skipped too.
#[derive(Clone)]
pub struct IdempotencyGuard<S> {
    store: S,
    processing_ttl: Duration,
    done_ttl: Duration,
}

impl<S> IdempotencyGuard<S>
where
    S: IdempotencyStore,
{
    pub fn new(store: S) -> Self {
        Self::with_ttls(store, DEFAULT_PROCESSING_TTL, DEFAULT_DONE_TTL)
    }

    pub fn with_ttls(store: S, processing_ttl: Duration, done_ttl: Duration) -> Self {
        Self {
            store,
            processing_ttl,
            done_ttl,
        }
    }

    #[tracing::instrument(name = "IdempotencyGuard::run", skip(self, operation))]
    pub async fn run<F, Fut, T, E>(
        &self,
        key: &str,
        operation: F,
    ) -> Result<IdempotencyOutcome<T>, IdempotencyError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match self.store.try_acquire(key, self.processing_ttl).await? {
            Acquisition::Acquired => {}
            Acquisition::Held(LockState::Processing) => {
                tracing::debug!("key is held by another caller");
                return Ok(IdempotencyOutcome::InProgress);
            }
            Acquisition::Held(LockState::Done) => {
                tracing::debug!("key already completed");
                return Ok(IdempotencyOutcome::AlreadyDone);
            }
        }

        match operation().await {
            Ok(value) => {
                // The operation has run; a failed state flip only shortens the replay
                // window to the processing TTL.
                if let Err(e) = self.store.mark_done(key, self.done_ttl).await {
                    tracing::warn!(error = %e, "failed to mark idempotency key done");
                }
                Ok(IdempotencyOutcome::Executed(value))
            }
            Err(e) => {
                if let Err(release_error) = self.store.release(key).await {
                    tracing::warn!(
                        error = %release_error,
                        "failed to release idempotency key; retries blocked until it expires"
                    );
                }
                Err(IdempotencyError::Operation(e))
            }
        }
    }
}
