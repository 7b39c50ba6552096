use warden_core::{
    AuditEvent, CredentialStore, EventPublisher, PasswordHasher, RawToken, TokenIssuer,
};

use crate::{
    error::CredentialError,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
    use_cases::refresh_session::refresh_error,
};

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Revokes a refresh token. Access tokens already issued stay valid until they expire.
    #[tracing::instrument(name = "CredentialService::logout", skip_all)]
    pub async fn logout(&self, refresh_token: &RawToken) -> Result<(), CredentialError> {
        let record = self
            .store
            .get_refresh_token(&refresh_token.hash())
            .await?
            .ok_or(CredentialError::InvalidRefreshToken)?;

        self.token_issuer
            .revoke_refresh_token(refresh_token)
            .await
            .map_err(refresh_error)?;

        self.emit_audit(AuditEvent::new(AUDIT_SERVICE, "logout", AUDIT_ENTITY).for_user(&record.user_id))
            .await;

        Ok(())
    }
}
