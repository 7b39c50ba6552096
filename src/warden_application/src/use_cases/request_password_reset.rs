use secrecy::ExposeSecret;
use warden_core::{
    AuditEvent, CredentialStore, Email, EventPublisher, PasswordHasher, TokenIssuer, TokenKind,
};

use crate::{
    error::CredentialError,
    notifications,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
};

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Starts a password reset.
    ///
    /// Reports success whether or not the email belongs to an account. For an unknown
    /// email nothing is written and nothing is published. Failures after the account
    /// lookup are logged rather than returned, since they would only occur for
    /// existing accounts.
    #[tracing::instrument(name = "CredentialService::request_password_reset", skip_all)]
    pub async fn request_password_reset(&self, email: &Email) -> Result<(), CredentialError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let issued = match self
            .verification_tokens
            .issue(&user.id, TokenKind::PasswordReset)
            .await
        {
            Ok(issued) => issued,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "failed to issue password reset token");
                return Ok(());
            }
        };

        self.emit_audit(
            AuditEvent::new(AUDIT_SERVICE, "password_reset_requested", AUDIT_ENTITY)
                .for_user(&user.id)
                .with_metadata("email", user.email.as_ref().expose_secret().as_str()),
        )
        .await;

        let link = self.links.password_reset_link(&issued.token);
        self.emit_notification(notifications::password_reset(&user, &link))
            .await;

        Ok(())
    }
}
