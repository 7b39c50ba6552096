use secrecy::{ExposeSecret, Secret};
use warden_core::{
    AuditEvent, CredentialStore, Email, EventPublisher, Password, PasswordHasher, PersonName,
    PhoneNumber, RawToken, TokenIssuer, TokenKind, User, ValidationError,
};

use crate::{
    error::CredentialError,
    notifications,
    service::{AUDIT_ENTITY, AUDIT_SERVICE, CredentialService},
};

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub email: Email,
    pub password: Password,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone_number: PhoneNumber,
}

impl RegistrationRequest {
    /// Validates raw registration fields.
    pub fn parse(
        email: Secret<String>,
        password: Secret<String>,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            email: Email::try_from(email)?,
            password: Password::try_from(password)?,
            first_name: PersonName::parse(first_name)?,
            last_name: PersonName::parse(last_name)?,
            phone_number: PhoneNumber::parse(phone_number)?,
        })
    }
}

impl<S, H, T, P> CredentialService<S, H, T, P>
where
    S: CredentialStore + Clone,
    H: PasswordHasher,
    T: TokenIssuer,
    P: EventPublisher,
{
    /// Creates an unverified account and sends its email verification link.
    ///
    /// # Returns
    /// The raw verification token, which is not recoverable from storage.
    #[tracing::instrument(name = "CredentialService::register", skip_all)]
    pub async fn register(&self, request: RegistrationRequest) -> Result<RawToken, CredentialError> {
        if self.store.get_user_by_email(&request.email).await?.is_some() {
            return Err(CredentialError::DuplicateEmail);
        }

        let phone_hash = request.phone_number.hash();
        if self
            .store
            .get_user_by_phone_hash(&phone_hash)
            .await?
            .is_some()
        {
            return Err(CredentialError::DuplicatePhone);
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = User::new(
            request.email,
            password_hash,
            request.first_name,
            request.last_name,
            request.phone_number,
        );

        // The unique constraints remain the arbiter when two registrations race past the lookups.
        self.store.create_user(&user).await?;

        let issued = self
            .verification_tokens
            .issue(&user.id, TokenKind::EmailVerification)
            .await?;

        tracing::info!(user_id = %user.id, "user registered");

        self.emit_audit(
            AuditEvent::new(AUDIT_SERVICE, "registration", AUDIT_ENTITY)
                .for_user(&user.id)
                .with_metadata("email", user.email.as_ref().expose_secret().as_str()),
        )
        .await;

        let link = self.links.email_verification_link(&issued.token);
        self.emit_notification(notifications::email_verification(&user, &link))
            .await;

        Ok(issued.token)
    }
}
