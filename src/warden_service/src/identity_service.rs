use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tokio::sync::RwLock;
use warden_adapters::{
    authentication::JwtTokenIssuer,
    config::{LinkSettings, Settings},
    events::KafkaEventPublisher,
    password::Argon2PasswordHasher,
    persistence::{PostgresCredentialStore, RedisIdempotencyStore},
};
use warden_application::{CredentialService, IdempotencyGuard, VerificationLinks};

use crate::helpers::{get_kafka_publisher, get_postgres_pool, get_redis_connection, run_migrations};

pub type WardenCredentialService = CredentialService<
    PostgresCredentialStore,
    Argon2PasswordHasher,
    JwtTokenIssuer<PostgresCredentialStore>,
    KafkaEventPublisher,
>;

/// Fully wired credential service plus the idempotency guard callers wrap
/// retried operations in.
pub struct IdentityService {
    pub credentials: WardenCredentialService,
    pub idempotency: IdempotencyGuard<RedisIdempotencyStore>,
}

impl IdentityService {
    pub fn new(
        pg_pool: PgPool,
        redis_conn: Arc<RwLock<redis::Connection>>,
        publisher: Option<KafkaEventPublisher>,
        settings: &Settings,
    ) -> Self {
        let store = PostgresCredentialStore::new(pg_pool);
        let token_issuer = JwtTokenIssuer::new(store.clone(), settings.auth.token_config());

        let credentials = CredentialService::new(
            store,
            Argon2PasswordHasher::new(),
            token_issuer,
            publisher,
            verification_links(&settings.links),
        );

        let idempotency = IdempotencyGuard::with_ttls(
            RedisIdempotencyStore::new(redis_conn),
            settings.idempotency.processing_ttl(),
            settings.idempotency.done_ttl(),
        );

        Self {
            credentials,
            idempotency,
        }
    }

    /// Connects to Postgres (applying migrations), Redis and, when configured, Kafka.
    #[tracing::instrument(name = "Building identity service", skip_all)]
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let pg_pool = get_postgres_pool(
            settings.postgres.url.expose_secret(),
            settings.postgres.max_connections,
        )
        .await
        .wrap_err("Failed to create Postgres connection pool")?;

        run_migrations(&pg_pool)
            .await
            .wrap_err("Failed to run migrations")?;

        let redis_conn = get_redis_connection(&settings.redis.host_name)
            .wrap_err("Failed to get Redis connection")?;

        let publisher = match &settings.kafka {
            Some(kafka) => Some(
                get_kafka_publisher(kafka).wrap_err("Failed to create Kafka producer")?,
            ),
            None => {
                tracing::info!("No Kafka settings; audit and notification events are disabled");
                None
            }
        };

        Ok(Self::new(pg_pool, redis_conn, publisher, settings))
    }
}

fn verification_links(links: &LinkSettings) -> VerificationLinks {
    VerificationLinks {
        email_verification_base_url: links.email_verification_base_url.clone(),
        password_reset_base_url: links.password_reset_base_url.clone(),
    }
}
