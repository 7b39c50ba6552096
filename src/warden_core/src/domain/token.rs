use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{user::UserId, validation_error::ValidationError};

const RAW_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub fn ttl(self) -> Duration {
        match self {
            Self::EmailVerification => Duration::hours(24),
            Self::PasswordReset => Duration::hours(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Opaque bearer value handed to a user exactly once. Never persisted.
#[derive(Debug, Clone)]
pub struct RawToken(Secret<String>);

impl RawToken {
    /// 256 bits from the thread-local CSPRNG, hex encoded.
    pub fn generate() -> Self {
        let bytes: [u8; RAW_TOKEN_BYTES] = rand::random();
        Self(Secret::new(hex::encode(bytes)))
    }

    pub fn hash(&self) -> TokenHash {
        TokenHash(hex::encode(Sha256::digest(
            self.0.expose_secret().as_bytes(),
        )))
    }
}

impl TryFrom<Secret<String>> for RawToken {
    type Error = ValidationError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let trimmed = value.expose_secret().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        Ok(Self(Secret::new(trimmed.to_owned())))
    }
}

impl AsRef<Secret<String>> for RawToken {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

/// Hex-encoded SHA-256 of a [`RawToken`]; the only form a token is stored or looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenHash(String);

impl TokenHash {
    pub fn from_hex(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Single-use email verification or password reset token record.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: TokenKind,
    pub token_hash: TokenHash,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(user_id: UserId, kind: TokenKind, token_hash: TokenHash) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            token_hash,
            expires_at: now + kind.ttl(),
            used: false,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: TokenHash,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(user_id: UserId, token_hash: TokenHash, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            expires_at: now + ttl,
            revoked: false,
            created_at: now,
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now <= self.expires_at
    }
}
