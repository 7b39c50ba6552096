use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    email::Email,
    phone_number::PhoneHash,
    token::{RefreshToken, TokenHash, TokenKind, VerificationToken},
    user::{PasswordHash, User, UserId},
};

// CredentialStore port trait and errors
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("A user with this phone number already exists")]
    DuplicatePhone,
    #[error("Record not found")]
    NotFound,
    #[error("Token already used")]
    TokenAlreadyUsed,
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for CredentialStoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DuplicateEmail, Self::DuplicateEmail) => true,
            (Self::DuplicatePhone, Self::DuplicatePhone) => true,
            (Self::NotFound, Self::NotFound) => true,
            (Self::TokenAlreadyUsed, Self::TokenAlreadyUsed) => true,
            (Self::InvariantViolation(_), Self::InvariantViolation(_)) => true,
            (Self::UnexpectedError(_), Self::UnexpectedError(_)) => true,
            _ => false,
        }
    }
}

/// Durable storage of users and their token records.
///
/// Lookups return `Ok(None)` for a missing record so callers can tell absence apart
/// from a storage failure. Updates keyed by id must touch exactly one row: zero rows is
/// [`CredentialStoreError::NotFound`], more than one is
/// [`CredentialStoreError::InvariantViolation`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<(), CredentialStoreError>;
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, CredentialStoreError>;
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, CredentialStoreError>;
    async fn get_user_by_phone_hash(
        &self,
        phone_hash: &PhoneHash,
    ) -> Result<Option<User>, CredentialStoreError>;
    async fn update_password(
        &self,
        user_id: &UserId,
        new_hash: &PasswordHash,
        updated_at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError>;
    async fn set_email_verified(&self, user_id: &UserId) -> Result<(), CredentialStoreError>;

    async fn create_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), CredentialStoreError>;
    async fn get_verification_token(
        &self,
        kind: TokenKind,
        token_hash: &TokenHash,
    ) -> Result<Option<VerificationToken>, CredentialStoreError>;
    /// Conditional on the token being unused. Losing the race yields
    /// [`CredentialStoreError::TokenAlreadyUsed`].
    async fn mark_verification_token_used(
        &self,
        kind: TokenKind,
        token_id: &Uuid,
    ) -> Result<(), CredentialStoreError>;
    /// Marks an email verification token used and verifies its owner as one unit.
    async fn redeem_email_verification(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
    ) -> Result<(), CredentialStoreError>;
    /// Marks a password reset token used and stores the new hash as one unit.
    async fn redeem_password_reset(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
        new_hash: &PasswordHash,
    ) -> Result<(), CredentialStoreError>;

    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), CredentialStoreError>;
    async fn get_refresh_token(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<RefreshToken>, CredentialStoreError>;
    /// Conditional on the token not already being revoked; otherwise `NotFound`.
    async fn revoke_refresh_token(&self, token_id: &Uuid) -> Result<(), CredentialStoreError>;
    /// Revokes `old_id` and stores `replacement` as one unit.
    async fn rotate_refresh_token(
        &self,
        old_id: &Uuid,
        replacement: &RefreshToken,
    ) -> Result<(), CredentialStoreError>;
}

// IdempotencyStore port trait and errors
#[derive(Debug, Error)]
pub enum IdempotencyStoreError {
    #[error("Idempotency store error: {0}")]
    StoreError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Processing,
    Done,
}

impl LockState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Result of a set-if-absent attempt on an idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Acquired,
    Held(LockState),
}

/// Shared key/value store offering atomic set-if-absent with expiry.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Creates `key` in [`LockState::Processing`] unless it already exists.
    async fn try_acquire(&self, key: &str, ttl: Duration)
    -> Result<Acquisition, IdempotencyStoreError>;
    async fn mark_done(&self, key: &str, ttl: Duration) -> Result<(), IdempotencyStoreError>;
    async fn release(&self, key: &str) -> Result<(), IdempotencyStoreError>;
}
