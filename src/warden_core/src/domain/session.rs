use chrono::{DateTime, Utc};
use secrecy::Secret;

use super::{email::Email, token::RawToken, user::UserId};

/// Signed, stateless access token and its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: Secret<String>,
    pub expires_at: DateTime<Utc>,
}

/// Identity carried by a validated access token.
#[derive(Debug, Clone)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub email: Email,
    pub expires_at: DateTime<Utc>,
}

/// A refresh token as handed to the caller; the raw value cannot be recovered afterwards.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: RawToken,
    pub expires_at: DateTime<Utc>,
}
