use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    email::Email,
    events::{AuditEvent, NotificationEvent},
    password::Password,
    session::{AccessClaims, AccessToken, IssuedRefreshToken},
    token::RawToken,
    user::{PasswordHash, UserId},
};

use super::repositories::CredentialStoreError;

#[derive(Debug, Error)]
pub enum EventPublisherError {
    #[error("Failed to serialise event: {0}")]
    Serialisation(String),
    #[error("Failed to deliver event to {topic}: {reason}")]
    Delivery { topic: String, reason: String },
}

/// Outbound side channel for audit and notification events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_audit(&self, event: &AuditEvent) -> Result<(), EventPublisherError>;
    async fn publish_notification(
        &self,
        event: &NotificationEvent,
    ) -> Result<(), EventPublisherError>;
}

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Slow, salted one-way password hashing.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(
        &self,
        candidate: &Password,
        expected: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;
}

#[derive(Debug, Error)]
pub enum TokenIssuerError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Expired token")]
    ExpiredToken,
    #[error("Credential store error: {0}")]
    StoreError(#[from] CredentialStoreError),
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

/// Issues stateless access tokens and stored, revocable refresh tokens.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    fn generate_access_token(
        &self,
        user_id: &UserId,
        email: &Email,
    ) -> Result<AccessToken, TokenIssuerError>;

    /// Fails with [`TokenIssuerError::InvalidToken`] on a bad signature or format and
    /// [`TokenIssuerError::ExpiredToken`] once the lifetime is exceeded.
    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, TokenIssuerError>;

    async fn generate_and_store_refresh_token(
        &self,
        user_id: &UserId,
    ) -> Result<IssuedRefreshToken, TokenIssuerError>;

    /// Exchanges a live refresh token for a new one, revoking the presented token.
    async fn rotate_refresh_token(
        &self,
        presented: &RawToken,
    ) -> Result<(UserId, IssuedRefreshToken), TokenIssuerError>;

    async fn revoke_refresh_token(&self, presented: &RawToken) -> Result<(), TokenIssuerError>;
}
