use warden_core::{
    AuditEvent, CredentialStore, EventPublisher, PasswordHasher, RawToken, TokenIssuer,
    TokenIssuerError,
};

use crate::{
    error::CredentialError,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
    use_cases::login::LoginTokens,
};

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Exchanges a refresh token for a new token pair. The presented token is revoked.
    #[tracing::instrument(name = "CredentialService::refresh_session", skip_all)]
    pub async fn refresh_session(&self, refresh_token: &RawToken) -> Result<LoginTokens, CredentialError> {
        let (user_id, refresh) = self
            .token_issuer
            .rotate_refresh_token(refresh_token)
            .await
            .map_err(refresh_error)?;

        let user = self
            .store
            .get_user_by_id(&user_id)
            .await?
            .ok_or(CredentialError::InvalidRefreshToken)?;

        let access = self.token_issuer.generate_access_token(&user.id, &user.email)?;

        self.emit_audit(AuditEvent::new(AUDIT_SERVICE, "token_refreshed", AUDIT_ENTITY).for_user(&user.id))
            .await;

        Ok(LoginTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }
}

pub(crate) fn refresh_error(error: TokenIssuerError) -> CredentialError {
    match error {
        TokenIssuerError::InvalidToken | TokenIssuerError::ExpiredToken => {
            CredentialError::InvalidRefreshToken
        }
        e => e.into(),
    }
}
