//! Hand-rolled port doubles shared by the use case tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;
use warden_core::{
    AccessClaims, AccessToken, Acquisition, AuditEvent, CredentialStore, CredentialStoreError,
    Email, EventPublisher, EventPublisherError, IdempotencyStore, IdempotencyStoreError,
    IssuedRefreshToken, LockState, NotificationEvent, Password, PasswordHash, PasswordHasher,
    PasswordHasherError, PersonName, PhoneHash, PhoneNumber, RawToken, RefreshToken, TokenHash,
    TokenIssuer, TokenIssuerError, TokenKind, User, UserId, VerificationToken,
};

pub const SAMPLE_PASSWORD: &str = "pw12345678";

pub fn email(value: &str) -> Email {
    Email::try_from(Secret::new(value.to_owned())).unwrap()
}

pub fn password(value: &str) -> Password {
    Password::try_from(Secret::new(value.to_owned())).unwrap()
}

pub fn sample_user(address: &str, phone: &str) -> User {
    User::new(
        email(address),
        PasswordHash::new(Secret::new(format!("plain${SAMPLE_PASSWORD}"))),
        PersonName::parse("A").unwrap(),
        PersonName::parse("B").unwrap(),
        PhoneNumber::parse(phone).unwrap(),
    )
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    verification_tokens: HashMap<Uuid, VerificationToken>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
    writes: usize,
}

#[derive(Clone, Default)]
pub struct MockCredentialStore {
    tables: Arc<Mutex<Tables>>,
}

impl MockCredentialStore {
    pub fn writes(&self) -> usize {
        self.tables.lock().unwrap().writes
    }

    pub fn reset_verified_flag(&self, user_id: &UserId) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.get_mut(user_id) {
            user.email_verified = false;
        }
    }

    pub fn verification_tokens_for(&self, user_id: &UserId, kind: TokenKind) -> usize {
        let tables = self.tables.lock().unwrap();
        tables
            .verification_tokens
            .values()
            .filter(|t| t.user_id == *user_id && t.kind == kind)
            .count()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn create_user(&self, user: &User) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(CredentialStoreError::DuplicateEmail);
        }
        if tables.users.values().any(|u| u.phone_hash == user.phone_hash) {
            return Err(CredentialStoreError::DuplicatePhone);
        }
        tables.users.insert(user.id, user.clone());
        tables.writes += 1;
        Ok(())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.values().find(|u| u.email == *email).cloned())
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, CredentialStoreError> {
        Ok(self.tables.lock().unwrap().users.get(user_id).cloned())
    }

    async fn get_user_by_phone_hash(
        &self,
        phone_hash: &PhoneHash,
    ) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .values()
            .find(|u| u.phone_hash == *phone_hash)
            .cloned())
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        new_hash: &PasswordHash,
        updated_at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or(CredentialStoreError::NotFound)?;
        user.replace_password_hash(new_hash.clone(), updated_at);
        tables.writes += 1;
        Ok(())
    }

    async fn set_email_verified(&self, user_id: &UserId) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or(CredentialStoreError::NotFound)?;
        user.email_verified = true;
        tables.writes += 1;
        Ok(())
    }

    async fn create_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.verification_tokens.insert(token.id, token.clone());
        tables.writes += 1;
        Ok(())
    }

    async fn get_verification_token(
        &self,
        kind: TokenKind,
        token_hash: &TokenHash,
    ) -> Result<Option<VerificationToken>, CredentialStoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .verification_tokens
            .values()
            .find(|t| t.kind == kind && t.token_hash == *token_hash)
            .cloned())
    }

    async fn mark_verification_token_used(
        &self,
        kind: TokenKind,
        token_id: &Uuid,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.verification_tokens.get_mut(token_id) {
            Some(token) if token.kind == kind && !token.used => {
                token.used = true;
                tables.writes += 1;
                Ok(())
            }
            _ => Err(CredentialStoreError::TokenAlreadyUsed),
        }
    }

    async fn redeem_email_verification(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        let tables = &mut *tables;
        let token = match tables.verification_tokens.get_mut(token_id) {
            Some(token) if !token.used => token,
            _ => return Err(CredentialStoreError::TokenAlreadyUsed),
        };
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or(CredentialStoreError::NotFound)?;
        token.used = true;
        user.email_verified = true;
        tables.writes += 1;
        Ok(())
    }

    async fn redeem_password_reset(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
        new_hash: &PasswordHash,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        let tables = &mut *tables;
        let token = match tables.verification_tokens.get_mut(token_id) {
            Some(token) if !token.used => token,
            _ => return Err(CredentialStoreError::TokenAlreadyUsed),
        };
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or(CredentialStoreError::NotFound)?;
        token.used = true;
        user.replace_password_hash(new_hash.clone(), Utc::now());
        tables.writes += 1;
        Ok(())
    }

    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.refresh_tokens.insert(token.id, token.clone());
        tables.writes += 1;
        Ok(())
    }

    async fn get_refresh_token(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<RefreshToken>, CredentialStoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == *token_hash)
            .cloned())
    }

    async fn revoke_refresh_token(&self, token_id: &Uuid) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.refresh_tokens.get_mut(token_id) {
            Some(token) if !token.revoked => {
                token.revoked = true;
                tables.writes += 1;
                Ok(())
            }
            _ => Err(CredentialStoreError::NotFound),
        }
    }

    async fn rotate_refresh_token(
        &self,
        old_id: &Uuid,
        replacement: &RefreshToken,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.refresh_tokens.get_mut(old_id) {
            Some(token) if !token.revoked => token.revoked = true,
            _ => return Err(CredentialStoreError::NotFound),
        }
        tables
            .refresh_tokens
            .insert(replacement.id, replacement.clone());
        tables.writes += 1;
        Ok(())
    }
}

/// Stores the password behind a marker prefix so tests stay fast.
#[derive(Clone, Default)]
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError> {
        Ok(PasswordHash::new(Secret::new(format!(
            "plain${}",
            password.as_ref().expose_secret()
        ))))
    }

    async fn verify(
        &self,
        candidate: &Password,
        expected: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let stored = expected.as_ref().expose_secret();
        let Some(plain) = stored.strip_prefix("plain$") else {
            return Err(PasswordHasherError::MalformedHash(stored.clone()));
        };
        Ok(plain == candidate.as_ref().expose_secret())
    }
}

/// Issues opaque access tokens and keeps refresh tokens in a [`MockCredentialStore`].
#[derive(Clone)]
pub struct StubTokenIssuer {
    store: MockCredentialStore,
}

impl StubTokenIssuer {
    pub fn new(store: MockCredentialStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TokenIssuer for StubTokenIssuer {
    fn generate_access_token(
        &self,
        user_id: &UserId,
        _email: &Email,
    ) -> Result<AccessToken, TokenIssuerError> {
        Ok(AccessToken {
            token: Secret::new(format!("access-{user_id}")),
            expires_at: Utc::now() + chrono::Duration::minutes(15),
        })
    }

    fn validate_access_token(&self, _token: &str) -> Result<AccessClaims, TokenIssuerError> {
        Err(TokenIssuerError::InvalidToken)
    }

    async fn generate_and_store_refresh_token(
        &self,
        user_id: &UserId,
    ) -> Result<IssuedRefreshToken, TokenIssuerError> {
        let token = RawToken::generate();
        let record = RefreshToken::new(*user_id, token.hash(), chrono::Duration::days(7));
        self.store.create_refresh_token(&record).await?;
        Ok(IssuedRefreshToken {
            token,
            expires_at: record.expires_at,
        })
    }

    async fn rotate_refresh_token(
        &self,
        presented: &RawToken,
    ) -> Result<(UserId, IssuedRefreshToken), TokenIssuerError> {
        let current = self
            .store
            .get_refresh_token(&presented.hash())
            .await?
            .filter(|t| t.is_usable_at(Utc::now()))
            .ok_or(TokenIssuerError::InvalidToken)?;

        let token = RawToken::generate();
        let record = RefreshToken::new(current.user_id, token.hash(), chrono::Duration::days(7));
        self.store
            .rotate_refresh_token(&current.id, &record)
            .await
            .map_err(|_| TokenIssuerError::InvalidToken)?;

        Ok((
            current.user_id,
            IssuedRefreshToken {
                token,
                expires_at: record.expires_at,
            },
        ))
    }

    async fn revoke_refresh_token(&self, presented: &RawToken) -> Result<(), TokenIssuerError> {
        let current = self
            .store
            .get_refresh_token(&presented.hash())
            .await?
            .ok_or(TokenIssuerError::InvalidToken)?;
        self.store
            .revoke_refresh_token(&current.id)
            .await
            .map_err(|_| TokenIssuerError::InvalidToken)
    }
}

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    audits: Arc<Mutex<Vec<AuditEvent>>>,
    notifications: Arc<Mutex<Vec<NotificationEvent>>>,
}

impl RecordingPublisher {
    pub fn audits(&self) -> Vec<AuditEvent> {
        self.audits.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<NotificationEvent> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn audit_actions(&self) -> Vec<String> {
        self.audits().into_iter().map(|e| e.action).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_audit(&self, event: &AuditEvent) -> Result<(), EventPublisherError> {
        self.audits.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_notification(
        &self,
        event: &NotificationEvent,
    ) -> Result<(), EventPublisherError> {
        self.notifications.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish_audit(&self, _event: &AuditEvent) -> Result<(), EventPublisherError> {
        Err(EventPublisherError::Delivery {
            topic: "audit-events".to_owned(),
            reason: "broker unavailable".to_owned(),
        })
    }

    async fn publish_notification(
        &self,
        _event: &NotificationEvent,
    ) -> Result<(), EventPublisherError> {
        Err(EventPublisherError::Delivery {
            topic: "notification-events".to_owned(),
            reason: "broker unavailable".to_owned(),
        })
    }
}

#[derive(Clone, Default)]
pub struct MockIdempotencyStore {
    entries: Arc<Mutex<HashMap<String, (LockState, Duration)>>>,
}

impl MockIdempotencyStore {
    pub fn state(&self, key: &str) -> Option<LockState> {
        self.entries.lock().unwrap().get(key).map(|(state, _)| *state)
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl IdempotencyStore for MockIdempotencyStore {
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Acquisition, IdempotencyStoreError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some((state, _)) = entries.get(key) {
            return Ok(Acquisition::Held(*state));
        }
        entries.insert(key.to_owned(), (LockState::Processing, ttl));
        Ok(Acquisition::Acquired)
    }

    async fn mark_done(&self, key: &str, ttl: Duration) -> Result<(), IdempotencyStoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), (LockState::Done, ttl));
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), IdempotencyStoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

pub type TestService =
    crate::CredentialService<MockCredentialStore, PlainPasswordHasher, StubTokenIssuer, RecordingPublisher>;

pub struct Harness {
    pub service: TestService,
    pub store: MockCredentialStore,
    pub publisher: RecordingPublisher,
}

pub fn harness() -> Harness {
    let store = MockCredentialStore::default();
    let publisher = RecordingPublisher::default();
    let service = crate::CredentialService::new(
        store.clone(),
        PlainPasswordHasher,
        StubTokenIssuer::new(store.clone()),
        Some(publisher.clone()),
        crate::VerificationLinks {
            email_verification_base_url: Some("https://app.test/verify".to_owned()),
            password_reset_base_url: Some("https://app.test/reset".to_owned()),
        },
    );
    Harness {
        service,
        store,
        publisher,
    }
}

pub fn registration(address: &str, phone: &str) -> crate::RegistrationRequest {
    crate::RegistrationRequest {
        email: email(address),
        password: password(SAMPLE_PASSWORD),
        first_name: PersonName::parse("A").unwrap(),
        last_name: PersonName::parse("B").unwrap(),
        phone_number: PhoneNumber::parse(phone).unwrap(),
    }
}

impl Harness {
    /// Registers and verifies a user, returning its id.
    pub async fn verified_user(&self, address: &str, phone: &str) -> UserId {
        let token = self
            .service
            .register(registration(address, phone))
            .await
            .unwrap();
        self.service.verify_email(&token).await.unwrap();
        self.store
            .get_user_by_email(&email(address))
            .await
            .unwrap()
            .unwrap()
            .id
    }
}
