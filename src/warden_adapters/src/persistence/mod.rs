pub mod hashmap_credential_store;
pub mod hashmap_idempotency_store;
pub mod postgres_credential_store;
pub mod redis_idempotency_store;

pub use hashmap_credential_store::HashMapCredentialStore;
pub use hashmap_idempotency_store::HashMapIdempotencyStore;
pub use postgres_credential_store::PostgresCredentialStore;
pub use redis_idempotency_store::RedisIdempotencyStore;
