use warden_core::{
    AuditEvent, CredentialStore, EventPublisher, NotificationEvent, PasswordHasher, TokenIssuer,
};

use crate::{notifications::VerificationLinks, verification::VerificationTokenManager};

pub const AUDIT_SERVICE: &str = "user";
pub const AUDIT_ENTITY: &str = "user";

/// Orchestrates registration, login, email verification and password flows.
///
/// Each use case lives in its own module under [`crate::use_cases`]. Audit and
/// notification publishing is best-effort: it never changes the outcome of the
/// credential mutation that triggered it.
pub struct CredentialService<S, H, T, P> {
    pub(crate) store: S,
    pub(crate) hasher: H,
    pub(crate) token_issuer: T,
    pub(crate) verification_tokens: VerificationTokenManager<S>,
    pub(crate) publisher: Option<P>,
    pub(crate) links: VerificationLinks,
}

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    pub fn new(
        store: S,
        hasher: H,
        token_issuer: T,
        publisher: Option<P>,
        links: VerificationLinks,
    ) -> Self {
        Self {
            verification_tokens: VerificationTokenManager::new(store.clone()),
            store,
            hasher,
            token_issuer,
            publisher,
            links,
        }
    }

    pub fn token_issuer(&self) -> &T {
        &self.token_issuer
    }

    pub(crate) async fn emit_audit(&self, event: AuditEvent) {
        let Some(publisher) = &self.publisher else {
            tracing::debug!(action = %event.action, "no event publisher configured, audit event dropped");
            return;
        };

        if let Err(e) = publisher.publish_audit(&event).await {
            tracing::warn!(error = %e, action = %event.action, "failed to publish audit event");
        }
    }

    pub(crate) async fn emit_notification(&self, event: NotificationEvent) {
        let Some(publisher) = &self.publisher else {
            tracing::debug!(kind = ?event.kind, "no event publisher configured, notification dropped");
            return;
        };

        if let Err(e) = publisher.publish_notification(&event).await {
            tracing::warn!(error = %e, kind = ?event.kind, "failed to publish notification event");
        }
    }
}
