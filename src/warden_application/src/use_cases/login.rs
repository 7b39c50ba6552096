use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use warden_core::{
    AuditEvent, CredentialStore, Email, EventPublisher, Password, PasswordHasher, RawToken,
    TokenIssuer, UserState,
};

use crate::{
    error::CredentialError,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
};

/// Tokens handed out on a successful login or refresh.
#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub access_token: Secret<String>,
    pub refresh_token: RawToken,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Authenticates a verified user and issues an access and refresh token pair.
    ///
    /// An unknown email and a wrong password are indistinguishable to the caller.
    /// An unverified account is rejected before its password is checked.
    #[tracing::instrument(name = "CredentialService::login", skip_all)]
    pub async fn login(
        &self,
        email: &Email,
        password: &Password,
    ) -> Result<LoginTokens, CredentialError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            return Err(CredentialError::InvalidCredentials);
        };

        if user.state() != UserState::Verified {
            return Err(CredentialError::EmailNotVerified);
        }

        if !self.hasher.verify(password, user.password_hash()).await? {
            return Err(CredentialError::InvalidCredentials);
        }

        let access = self.token_issuer.generate_access_token(&user.id, &user.email)?;
        let refresh = self
            .token_issuer
            .generate_and_store_refresh_token(&user.id)
            .await?;

        self.emit_audit(
            AuditEvent::new(AUDIT_SERVICE, "login", AUDIT_ENTITY)
                .for_user(&user.id)
                .with_metadata("email", user.email.as_ref().expose_secret().as_str()),
        )
        .await;

        Ok(LoginTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }
}
