use std::time::Duration;

use testcontainers_modules::redis::{REDIS_PORT, Redis};
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use tokio::task::JoinSet;
use warden_adapters::persistence::RedisIdempotencyStore;
use warden_application::{IdempotencyGuard, IdempotencyOutcome};
use warden_core::{Acquisition, IdempotencyStore, LockState};
use warden_service::get_redis_connection;

async fn start_store() -> (ContainerAsync<Redis>, RedisIdempotencyStore) {
    let container = Redis::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(REDIS_PORT).await.unwrap();

    let conn = get_redis_connection(&format!("{host}:{port}")).unwrap();
    (container, RedisIdempotencyStore::new(conn))
}

const TTL: Duration = Duration::from_secs(60);

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn lock_moves_from_processing_to_done() {
    let (_container, store) = start_store().await;

    assert_eq!(
        store.try_acquire("tx-1", TTL).await.unwrap(),
        Acquisition::Acquired
    );
    assert_eq!(
        store.try_acquire("tx-1", TTL).await.unwrap(),
        Acquisition::Held(LockState::Processing)
    );

    store.mark_done("tx-1", TTL).await.unwrap();
    assert_eq!(
        store.try_acquire("tx-1", TTL).await.unwrap(),
        Acquisition::Held(LockState::Done)
    );
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn released_key_can_be_acquired_again() {
    let (_container, store) = start_store().await;

    store.try_acquire("tx-1", TTL).await.unwrap();
    store.release("tx-1").await.unwrap();

    assert_eq!(
        store.try_acquire("tx-1", TTL).await.unwrap(),
        Acquisition::Acquired
    );
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn processing_lock_expires() {
    let (_container, store) = start_store().await;

    store
        .try_acquire("tx-1", Duration::from_secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(
        store.try_acquire("tx-1", TTL).await.unwrap(),
        Acquisition::Acquired
    );
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn guard_runs_operation_once_across_concurrent_callers() {
    let (_container, store) = start_store().await;
    let guard = std::sync::Arc::new(IdempotencyGuard::new(store));

    let mut callers = JoinSet::new();
    for _ in 0..8 {
        let guard = guard.clone();
        callers.spawn(async move {
            guard
                .run("payment-42", || async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok::<_, String>(())
                })
                .await
                .unwrap()
        });
    }

    let mut executed = 0;
    while let Some(outcome) = callers.join_next().await {
        if let IdempotencyOutcome::Executed(()) = outcome.unwrap() {
            executed += 1;
        }
    }
    assert_eq!(executed, 1);
}
