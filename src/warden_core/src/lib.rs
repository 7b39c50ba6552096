pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    email::Email,
    events::{AuditEvent, Metadata, NotificationChannel, NotificationEvent, NotificationKind},
    password::Password,
    person_name::PersonName,
    phone_number::{PhoneHash, PhoneNumber},
    session::{AccessClaims, AccessToken, IssuedRefreshToken},
    token::{RawToken, RefreshToken, TokenHash, TokenKind, VerificationToken},
    user::{PasswordHash, User, UserId, UserState},
    validation_error::ValidationError,
};

pub use ports::{
    repositories::{
        Acquisition, CredentialStore, CredentialStoreError, IdempotencyStore,
        IdempotencyStoreError, LockState,
    },
    services::{
        EventPublisher, EventPublisherError, PasswordHasher, PasswordHasherError, TokenIssuer,
        TokenIssuerError,
    },
};
