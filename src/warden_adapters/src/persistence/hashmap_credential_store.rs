use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use warden_core::{
    CredentialStore, CredentialStoreError, Email, PasswordHash, PhoneHash, RefreshToken,
    TokenHash, TokenKind, User, UserId, VerificationToken,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    verification_tokens: HashMap<Uuid, VerificationToken>,
    refresh_tokens: HashMap<Uuid, RefreshToken>,
}

impl Tables {
    fn user_mut(&mut self, user_id: &UserId) -> Result<&mut User, CredentialStoreError> {
        self.users
            .get_mut(user_id)
            .ok_or(CredentialStoreError::NotFound)
    }

    fn unused_token_mut(
        &mut self,
        kind: TokenKind,
        token_id: &Uuid,
    ) -> Result<&mut VerificationToken, CredentialStoreError> {
        let token = self
            .verification_tokens
            .get_mut(token_id)
            .filter(|token| token.kind == kind)
            .ok_or(CredentialStoreError::NotFound)?;

        if token.used {
            return Err(CredentialStoreError::TokenAlreadyUsed);
        }
        Ok(token)
    }

    /// Marks an unused token of `kind` owned by `user_id` as used.
    ///
    /// A token owned by someone else cannot be claimed, mirroring the conditional
    /// `UPDATE` of the Postgres store.
    fn claim_token(
        &mut self,
        kind: TokenKind,
        token_id: &Uuid,
        user_id: &UserId,
    ) -> Result<(), CredentialStoreError> {
        let token = self.unused_token_mut(kind, token_id)?;
        if token.user_id != *user_id {
            return Err(CredentialStoreError::TokenAlreadyUsed);
        }
        token.used = true;
        Ok(())
    }
}

/// In-memory credential store. Every compound operation runs under a single write lock,
/// which gives it the same all-or-nothing behavior as the transactional store.
#[derive(Default, Clone)]
pub struct HashMapCredentialStore {
    tables: Arc<RwLock<Tables>>,
}

impl HashMapCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for HashMapCredentialStore {
    async fn create_user(&self, user: &User) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(CredentialStoreError::DuplicateEmail);
        }
        if tables.users.values().any(|u| u.phone_hash == user.phone_hash) {
            return Err(CredentialStoreError::DuplicatePhone);
        }

        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(user_id).cloned())
    }

    async fn get_user_by_phone_hash(
        &self,
        phone_hash: &PhoneHash,
    ) -> Result<Option<User>, CredentialStoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| &u.phone_hash == phone_hash)
            .cloned())
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        new_hash: &PasswordHash,
        updated_at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        tables
            .user_mut(user_id)?
            .replace_password_hash(new_hash.clone(), updated_at);
        Ok(())
    }

    async fn set_email_verified(&self, user_id: &UserId) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        let user = tables.user_mut(user_id)?;
        user.email_verified = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn create_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&token.user_id) {
            return Err(CredentialStoreError::NotFound);
        }
        tables.verification_tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn get_verification_token(
        &self,
        kind: TokenKind,
        token_hash: &TokenHash,
    ) -> Result<Option<VerificationToken>, CredentialStoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .verification_tokens
            .values()
            .find(|t| t.kind == kind && &t.token_hash == token_hash)
            .cloned())
    }

    async fn mark_verification_token_used(
        &self,
        kind: TokenKind,
        token_id: &Uuid,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        tables.unused_token_mut(kind, token_id)?.used = true;
        Ok(())
    }

    async fn redeem_email_verification(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        tables.user_mut(user_id)?;
        tables.claim_token(TokenKind::EmailVerification, token_id, user_id)?;

        let user = tables.user_mut(user_id)?;
        user.email_verified = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn redeem_password_reset(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
        new_hash: &PasswordHash,
    ) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        tables.user_mut(user_id)?;
        tables.claim_token(TokenKind::PasswordReset, token_id, user_id)?;

        tables
            .user_mut(user_id)?
            .replace_password_hash(new_hash.clone(), Utc::now());
        Ok(())
    }

    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&token.user_id) {
            return Err(CredentialStoreError::NotFound);
        }
        tables.refresh_tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn get_refresh_token(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<RefreshToken>, CredentialStoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .values()
            .find(|t| &t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_refresh_token(&self, token_id: &Uuid) -> Result<(), CredentialStoreError> {
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.get_mut(token_id) {
            Some(token) if !token.revoked => {
                token.revoked = true;
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
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.get_mut(old_id) {
            Some(token) if !token.revoked => token.revoked = true,
            _ => return Err(CredentialStoreError::NotFound),
        }
        tables
            .refresh_tokens
            .insert(replacement.id, replacement.clone());
        Ok(())
    }
}
