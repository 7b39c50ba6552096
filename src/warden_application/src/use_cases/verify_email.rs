use warden_core::{
    AuditEvent, CredentialStore, EventPublisher, PasswordHasher, RawToken, TokenIssuer,
};

use crate::{
    error::CredentialError,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
    verification::TokenEffect,
};

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Redeems an email verification token, moving its owner to the verified state.
    #[tracing::instrument(name = "CredentialService::verify_email", skip_all)]
    pub async fn verify_email(&self, token: &RawToken) -> Result<(), CredentialError> {
        let redeemed = self
            .verification_tokens
            .consume(token, TokenEffect::VerifyEmail)
            .await?;

        tracing::info!(user_id = %redeemed.user_id, "email verified");

        self.emit_audit(
            AuditEvent::new(AUDIT_SERVICE, "email_verified", AUDIT_ENTITY)
                .for_user(&redeemed.user_id),
        )
        .await;

        Ok(())
    }
}
