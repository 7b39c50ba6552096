use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, Secret};

use super::validation_error::ValidationError;

pub const EMAIL_MAX_LENGTH: usize = 255;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// A normalised (trimmed, lower-cased) email address.
#[derive(Debug, Clone)]
pub struct Email(Secret<String>);

impl TryFrom<Secret<String>> for Email {
    type Error = ValidationError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let normalised = value.expose_secret().trim().to_lowercase();

        if normalised.len() > EMAIL_MAX_LENGTH {
            return Err(ValidationError::EmailTooLong {
                max: EMAIL_MAX_LENGTH,
            });
        }
        if !EMAIL_REGEX.is_match(&normalised) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Self(Secret::new(normalised)))
    }
}

impl AsRef<Secret<String>> for Email {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for Email {}

impl Hash for Email {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.expose_secret().hash(state);
    }
}
