use thiserror::Error;

/// Rejection of malformed input, raised before anything touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("email must be a valid email address")]
    InvalidEmail,
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("password must be at most {max} characters")]
    PasswordTooLong { max: usize },
    #[error("name must be between 1 and {max} characters")]
    InvalidName { max: usize },
    #[error("phone number must contain between {min} and {max} digits")]
    InvalidPhoneNumber { min: usize, max: usize },
    #[error("token is required")]
    EmptyToken,
}
