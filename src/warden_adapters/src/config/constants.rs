pub mod env {
    pub const ENV_PREFIX: &str = "WARDEN";
    pub const ENV_SEPARATOR: &str = "__";

    pub const DATABASE_URL_ENV_VAR: &str = "WARDEN_POSTGRES__URL";
    pub const REDIS_HOST_NAME_ENV_VAR: &str = "WARDEN_REDIS__HOST_NAME";
    pub const KAFKA_BROKERS_ENV_VAR: &str = "WARDEN_KAFKA__BROKERS";
    pub const JWT_SECRET_ENV_VAR: &str = "WARDEN_AUTH__JWT_SECRET";
}

pub const DEFAULT_CONFIG_FILE: &str = "config/default";
pub const LOCAL_CONFIG_FILE: &str = "config/local";

pub const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;
pub const DEFAULT_REDIS_HOST_NAME: &str = "127.0.0.1";

pub const DEFAULT_AUDIT_TOPIC: &str = "audit-events";
pub const DEFAULT_NOTIFICATION_TOPIC: &str = "notification-events";
pub const DEFAULT_KAFKA_TIMEOUT_IN_MILLIS: u64 = 5_000;

pub const DEFAULT_JWT_ISSUER: &str = "warden";
pub const DEFAULT_JWT_AUDIENCE: &str = "warden-api";
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

pub const DEFAULT_PROCESSING_TTL_SECONDS: u64 = 60 * 60;
pub const DEFAULT_DONE_TTL_SECONDS: u64 = 24 * 60 * 60;
