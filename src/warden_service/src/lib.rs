pub mod helpers;
pub mod identity_service;
pub mod telemetry;

pub use helpers::{
    get_kafka_publisher, get_postgres_pool, get_redis_client, get_redis_connection,
    run_migrations,
};
pub use identity_service::{IdentityService, WardenCredentialService};
pub use telemetry::init_tracing;
