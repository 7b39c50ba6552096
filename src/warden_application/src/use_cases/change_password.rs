use chrono::Utc;
use secrecy::ExposeSecret;
use warden_core::{
    AuditEvent, CredentialStore, Email, EventPublisher, Password, PasswordHasher, TokenIssuer,
};

use crate::{
    error::CredentialError,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
};

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Replaces the password of an already authenticated user.
    ///
    /// # Arguments
    /// * `email` - Email taken from the caller's validated access token
    /// * `old_password` - Must match the stored hash
    /// * `new_password` - The password to store
    #[tracing::instrument(name = "CredentialService::change_password", skip_all)]
    pub async fn change_password(
        &self,
        email: &Email,
        old_password: &Password,
        new_password: Password,
    ) -> Result<(), CredentialError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(CredentialError::NotFound)?;

        if !self.hasher.verify(old_password, user.password_hash()).await? {
            return Err(CredentialError::InvalidCurrentPassword);
        }

        let new_hash = self.hasher.hash(&new_password).await?;
        self.store
            .update_password(&user.id, &new_hash, Utc::now())
            .await?;

        self.emit_audit(
            AuditEvent::new(AUDIT_SERVICE, "password_changed", AUDIT_ENTITY)
                .for_user(&user.id)
                .with_metadata("email", user.email.as_ref().expose_secret().as_str()),
        )
        .await;

        Ok(())
    }
}
