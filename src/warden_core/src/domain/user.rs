use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    email::Email,
    person_name::PersonName,
    phone_number::{PhoneHash, PhoneNumber},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Salted one-way password hash in PHC string format.
#[derive(Debug, Clone)]
pub struct PasswordHash(Secret<String>);

impl PasswordHash {
    pub fn new(phc: Secret<String>) -> Self {
        Self(phc)
    }
}

impl AsRef<Secret<String>> for PasswordHash {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

/// Lifecycle position of a registered account. An unregistered user simply has no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    PendingVerification,
    Verified,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    password_hash: PasswordHash,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone_number: PhoneNumber,
    pub phone_hash: PhoneHash,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a freshly registered user awaiting email verification.
    pub fn new(
        email: Email,
        password_hash: PasswordHash,
        first_name: PersonName,
        last_name: PersonName,
        phone_number: PhoneNumber,
    ) -> Self {
        let now = Utc::now();
        let phone_hash = phone_number.hash();

        Self {
            id: UserId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            phone_number,
            phone_hash,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> UserState {
        if self.email_verified {
            UserState::Verified
        } else {
            UserState::PendingVerification
        }
    }

    /// Stored hash, for the credential store and the password hasher only.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn replace_password_hash(&mut self, hash: PasswordHash, updated_at: DateTime<Utc>) {
        self.password_hash = hash;
        self.updated_at = updated_at;
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.as_str(), self.last_name.as_str())
    }
}
