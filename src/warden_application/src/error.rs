use thiserror::Error;
use warden_core::{
    CredentialStoreError, PasswordHasherError, TokenIssuerError, ValidationError,
};

use crate::verification::VerificationTokenError;

/// Broad failure classes, used to pick a response without leaking which precise check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    AuthenticationFailed,
    TokenInvalid,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("A user with this phone number already exists")]
    DuplicatePhone,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email not verified")]
    EmailNotVerified,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Token already used")]
    TokenAlreadyUsed,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("User not found")]
    NotFound,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("Invalid current password")]
    InvalidCurrentPassword,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CredentialError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::DuplicateEmail | Self::DuplicatePhone | Self::AlreadyVerified => {
                ErrorCategory::Conflict
            }
            Self::InvalidCredentials | Self::EmailNotVerified | Self::InvalidCurrentPassword => {
                ErrorCategory::AuthenticationFailed
            }
            Self::InvalidOrExpiredToken
            | Self::TokenAlreadyUsed
            | Self::TokenExpired
            | Self::InvalidRefreshToken => ErrorCategory::TokenInvalid,
            Self::NotFound => ErrorCategory::NotFound,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Message safe to show an end user.
    ///
    /// Every token failure collapses to one message so responses cannot be used to probe
    /// which tokens exist. A login rejection reads the same whether the account is unknown,
    /// unverified or given the wrong password. Internal details never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidCredentials | Self::EmailNotVerified => {
                "Invalid email or password".to_owned()
            }
            _ => match self.category() {
                ErrorCategory::TokenInvalid => "Invalid or expired token".to_owned(),
                ErrorCategory::Internal => "Something went wrong, please try again".to_owned(),
                _ => self.to_string(),
            },
        }
    }
}

impl From<CredentialStoreError> for CredentialError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::DuplicateEmail => Self::DuplicateEmail,
            CredentialStoreError::DuplicatePhone => Self::DuplicatePhone,
            CredentialStoreError::NotFound => Self::NotFound,
            CredentialStoreError::TokenAlreadyUsed => Self::TokenAlreadyUsed,
            e @ (CredentialStoreError::InvariantViolation(_)
            | CredentialStoreError::UnexpectedError(_)) => Self::Internal(e.to_string()),
        }
    }
}

impl From<PasswordHasherError> for CredentialError {
    fn from(error: PasswordHasherError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<TokenIssuerError> for CredentialError {
    fn from(error: TokenIssuerError) -> Self {
        match error {
            TokenIssuerError::StoreError(e) => e.into(),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<VerificationTokenError> for CredentialError {
    fn from(error: VerificationTokenError) -> Self {
        match error {
            VerificationTokenError::InvalidOrExpiredToken => Self::InvalidOrExpiredToken,
            VerificationTokenError::TokenAlreadyUsed => Self::TokenAlreadyUsed,
            VerificationTokenError::TokenExpired => Self::TokenExpired,
            VerificationTokenError::StoreError(e) => e.into(),
        }
    }
}
