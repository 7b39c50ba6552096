use std::sync::Arc;

use rdkafka::error::KafkaError;
use redis::{Client, RedisResult};
use sqlx::{PgPool, migrate::MigrateError, postgres::PgPoolOptions};
use tokio::sync::RwLock;
use warden_adapters::{config::KafkaSettings, events::KafkaEventPublisher};

pub async fn get_postgres_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

/// Applies the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!().run(pool).await
}

pub fn get_redis_client(redis_hostname: &str) -> RedisResult<Client> {
    let redis_url = format!("redis://{}/", redis_hostname);
    redis::Client::open(redis_url)
}

pub fn get_redis_connection(redis_hostname: &str) -> RedisResult<Arc<RwLock<redis::Connection>>> {
    let conn = get_redis_client(redis_hostname)?.get_connection()?;
    Ok(Arc::new(RwLock::new(conn)))
}

pub fn get_kafka_publisher(settings: &KafkaSettings) -> Result<KafkaEventPublisher, KafkaError> {
    KafkaEventPublisher::from_brokers(&settings.brokers, settings.topics(), settings.timeout())
}
