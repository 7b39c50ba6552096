use warden_core::{
    CredentialStore, Email, EventPublisher, PasswordHasher, TokenIssuer, TokenKind, UserState,
};

use crate::{error::CredentialError, notifications, service::CredentialService};

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Issues a fresh verification token for an account still pending verification.
    ///
    /// Earlier tokens stay valid until they expire or are used.
    #[tracing::instrument(name = "CredentialService::resend_email_verification", skip_all)]
    pub async fn resend_email_verification(&self, email: &Email) -> Result<(), CredentialError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(CredentialError::NotFound)?;

        if user.state() == UserState::Verified {
            return Err(CredentialError::AlreadyVerified);
        }

        let issued = self
            .verification_tokens
            .issue(&user.id, TokenKind::EmailVerification)
            .await?;

        let link = self.links.email_verification_link(&issued.token);
        self.emit_notification(notifications::email_verification(&user, &link))
            .await;

        Ok(())
    }
}
