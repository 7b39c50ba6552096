use sha2::{Digest, Sha256};

use super::validation_error::ValidationError;

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 20;

/// A phone number with separators stripped: an optional leading `+` followed by digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = ValidationError::InvalidPhoneNumber {
            min: PHONE_MIN_DIGITS,
            max: PHONE_MAX_DIGITS,
        };

        let trimmed = value.trim();
        let (prefix, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", trimmed),
        };

        let digits: String = rest.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        if !digits.chars().all(|c| c.is_ascii_digit())
            || !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len())
        {
            return Err(invalid);
        }

        Ok(Self(format!("{prefix}{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic lookup key for this number.
    pub fn hash(&self) -> PhoneHash {
        PhoneHash(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

/// Hex-encoded SHA-256 of a normalised phone number. Unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneHash(String);

impl PhoneHash {
    /// Wraps a hash read back from storage.
    pub fn from_hex(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
