use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

use super::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_AUDIT_TOPIC, DEFAULT_CONFIG_FILE,
    DEFAULT_DONE_TTL_SECONDS, DEFAULT_JWT_AUDIENCE, DEFAULT_JWT_ISSUER,
    DEFAULT_KAFKA_TIMEOUT_IN_MILLIS, DEFAULT_MAX_DB_CONNECTIONS, DEFAULT_NOTIFICATION_TOPIC,
    DEFAULT_PROCESSING_TTL_SECONDS, DEFAULT_REDIS_HOST_NAME, DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
    LOCAL_CONFIG_FILE,
    env::{ENV_PREFIX, ENV_SEPARATOR},
};
use crate::authentication::JwtTokenConfig;
use crate::events::EventTopics;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    /// Events are not published when this section is absent.
    #[serde(default)]
    pub kafka: Option<KafkaSettings>,
    pub auth: AuthSettings,
    #[serde(default)]
    pub links: LinkSettings,
    #[serde(default)]
    pub idempotency: IdempotencySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub host_name: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host_name: DEFAULT_REDIS_HOST_NAME.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KafkaSettings {
    pub brokers: String,
    #[serde(default = "default_audit_topic")]
    pub audit_topic: String,
    #[serde(default = "default_notification_topic")]
    pub notification_topic: String,
    #[serde(default = "default_kafka_timeout")]
    pub timeout_in_millis: u64,
}

impl KafkaSettings {
    pub fn topics(&self) -> EventTopics {
        EventTopics {
            audit: self.audit_topic.clone(),
            notification: self.notification_topic.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: Secret<String>,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_seconds: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_seconds: i64,
}

impl AuthSettings {
    pub fn token_config(&self) -> JwtTokenConfig {
        JwtTokenConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            access_token_ttl: chrono::Duration::seconds(self.access_token_ttl_seconds),
            refresh_token_ttl: chrono::Duration::seconds(self.refresh_token_ttl_seconds),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkSettings {
    pub email_verification_base_url: Option<String>,
    pub password_reset_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdempotencySettings {
    #[serde(default = "default_processing_ttl")]
    pub processing_ttl_seconds: u64,
    #[serde(default = "default_done_ttl")]
    pub done_ttl_seconds: u64,
}

impl IdempotencySettings {
    pub fn processing_ttl(&self) -> Duration {
        Duration::from_secs(self.processing_ttl_seconds)
    }

    pub fn done_ttl(&self) -> Duration {
        Duration::from_secs(self.done_ttl_seconds)
    }
}

impl Default for IdempotencySettings {
    fn default() -> Self {
        Self {
            processing_ttl_seconds: DEFAULT_PROCESSING_TTL_SECONDS,
            done_ttl_seconds: DEFAULT_DONE_TTL_SECONDS,
        }
    }
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_DB_CONNECTIONS
}

fn default_audit_topic() -> String {
    DEFAULT_AUDIT_TOPIC.to_owned()
}

fn default_notification_topic() -> String {
    DEFAULT_NOTIFICATION_TOPIC.to_owned()
}

fn default_kafka_timeout() -> u64 {
    DEFAULT_KAFKA_TIMEOUT_IN_MILLIS
}

fn default_issuer() -> String {
    DEFAULT_JWT_ISSUER.to_owned()
}

fn default_audience() -> String {
    DEFAULT_JWT_AUDIENCE.to_owned()
}

fn default_access_token_ttl() -> i64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECONDS
}

fn default_refresh_token_ttl() -> i64 {
    DEFAULT_REFRESH_TOKEN_TTL_SECONDS
}

fn default_processing_ttl() -> u64 {
    DEFAULT_PROCESSING_TTL_SECONDS
}

fn default_done_ttl() -> u64 {
    DEFAULT_DONE_TTL_SECONDS
}

impl Settings {
    /// Reads `.env`, then `config/default` and `config/local` (both optional), then
    /// `WARDEN_*` environment variables, later sources overriding earlier ones.
    #[tracing::instrument(name = "Loading settings")]
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::with_name(LOCAL_CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}
