//! # Warden - Credential Lifecycle Library
//!
//! Facade crate that re-exports the public API of the warden components: registration,
//! email verification, login, password reset and change, refresh token rotation, and an
//! idempotency guard for retried operations.
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `User`, `RawToken`, etc.
//! - **Ports**: `CredentialStore`, `IdempotencyStore`, `EventPublisher`, `TokenIssuer`, `PasswordHasher`
//! - **Application**: `CredentialService`, `IdempotencyGuard`, `CredentialError`
//! - **Adapters**: `PostgresCredentialStore`, `RedisIdempotencyStore`, `KafkaEventPublisher`, etc.
//! - **Service**: `IdentityService` - a fully wired service built from `Settings`

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use warden_core::*;
}

pub use warden_core::{
    AccessClaims, AccessToken, AuditEvent, Email, IssuedRefreshToken, NotificationEvent,
    Password, PersonName, PhoneNumber, RawToken, TokenKind, User, UserId, ValidationError,
};

// ============================================================================
// Ports
// ============================================================================

pub use warden_core::{
    CredentialStore, CredentialStoreError, EventPublisher, EventPublisherError,
    IdempotencyStore, IdempotencyStoreError, PasswordHasher, PasswordHasherError, TokenIssuer,
    TokenIssuerError,
};

// ============================================================================
// Application Layer
// ============================================================================

/// Orchestration, verification tokens and idempotency
pub mod application {
    pub use warden_application::*;
}

pub use warden_application::{
    CredentialError, CredentialService, ErrorCategory, IdempotencyError, IdempotencyGuard,
    IdempotencyOutcome, LoginTokens, RegistrationRequest, VerificationLinks,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Credential and idempotency stores
    pub mod persistence {
        pub use warden_adapters::persistence::*;
    }

    /// Access and refresh token issuing
    pub mod authentication {
        pub use warden_adapters::authentication::*;
    }

    /// Password hashing
    pub mod password {
        pub use warden_adapters::password::*;
    }

    /// Event publishers
    pub mod events {
        pub use warden_adapters::events::*;
    }

    /// Configuration
    pub mod config {
        pub use warden_adapters::config::*;
    }
}

pub use warden_adapters::{
    authentication::{JwtTokenConfig, JwtTokenIssuer},
    config::Settings,
    events::{KafkaEventPublisher, RecordingEventPublisher},
    password::Argon2PasswordHasher,
    persistence::{
        HashMapCredentialStore, HashMapIdempotencyStore, PostgresCredentialStore,
        RedisIdempotencyStore,
    },
};

// ============================================================================
// Service (Main Entry Point)
// ============================================================================

pub use warden_service::{IdentityService, WardenCredentialService, init_tracing};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the port traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
