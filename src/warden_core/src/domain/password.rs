use secrecy::{ExposeSecret, Secret};

use super::validation_error::ValidationError;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 72;

/// A plaintext password candidate. Only ever lives in memory long enough to be hashed or verified.
#[derive(Debug, Clone)]
pub struct Password(Secret<String>);

impl TryFrom<Secret<String>> for Password {
    type Error = ValidationError;

    fn try_from(value: Secret<String>) -> Result<Self, Self::Error> {
        let length = value.expose_secret().chars().count();

        if length < PASSWORD_MIN_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
            });
        }
        if length > PASSWORD_MAX_LENGTH {
            return Err(ValidationError::PasswordTooLong {
                max: PASSWORD_MAX_LENGTH,
            });
        }

        Ok(Self(value))
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}
