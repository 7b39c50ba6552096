pub mod error;
pub mod idempotency;
pub mod notifications;
pub mod service;
pub mod use_cases;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CredentialError, ErrorCategory};
pub use idempotency::{IdempotencyError, IdempotencyGuard, IdempotencyOutcome};
pub use notifications::VerificationLinks;
pub use service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService};
pub use use_cases::{login::LoginTokens, register::RegistrationRequest};
pub use verification::{
    IssuedVerificationToken, TokenEffect, VerificationTokenError, VerificationTokenManager,
};
