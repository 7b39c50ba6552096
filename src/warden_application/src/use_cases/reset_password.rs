use warden_core::{
    AuditEvent, CredentialStore, EventPublisher, Password, PasswordHasher, RawToken, TokenIssuer,
    TokenKind,
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
    /// Redeems a password reset token and stores the new password with it.
    #[tracing::instrument(name = "CredentialService::reset_password", skip_all)]
    pub async fn reset_password(
        &self,
        token: &RawToken,
        new_password: Password,
    ) -> Result<(), CredentialError> {
        // Check the token before paying for a password hash.
        let record = self
            .verification_tokens
            .validate(token, TokenKind::PasswordReset)
            .await?;

        let new_hash = self.hasher.hash(&new_password).await?;
        self.verification_tokens
            .redeem(&record, TokenEffect::ResetPassword(new_hash))
            .await?;

        tracing::info!(user_id = %record.user_id, "password reset completed");

        self.emit_audit(
            AuditEvent::new(AUDIT_SERVICE, "password_reset_completed", AUDIT_ENTITY)
                .for_user(&record.user_id)
                .with_metadata("user_id", record.user_id.to_string()),
        )
        .await;

        Ok(())
    }
}
