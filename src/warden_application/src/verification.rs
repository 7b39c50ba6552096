use chrono::{DateTime, Utc};
use thiserror::Error;
use warden_core::{
    CredentialStore, CredentialStoreError, PasswordHash, RawToken, TokenKind, UserId,
    VerificationToken,
};

#[derive(Debug, Error)]
pub enum VerificationTokenError {
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Token already used")]
    TokenAlreadyUsed,
    #[error("Token expired")]
    TokenExpired,
    #[error("Credential store error: {0}")]
    StoreError(CredentialStoreError),
}

impl From<CredentialStoreError> for VerificationTokenError {
    fn from(error: CredentialStoreError) -> Self {
        match error {
            CredentialStoreError::TokenAlreadyUsed => Self::TokenAlreadyUsed,
            e => Self::StoreError(e),
        }
    }
}

/// A freshly issued verification token. The raw value exists only here.
#[derive(Debug, Clone)]
pub struct IssuedVerificationToken {
    pub token: RawToken,
    pub expires_at: DateTime<Utc>,
}

/// What redeeming a token does to its owner.
#[derive(Debug, Clone)]
pub enum TokenEffect {
    VerifyEmail,
    ResetPassword(PasswordHash),
}

impl TokenEffect {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::VerifyEmail => TokenKind::EmailVerification,
            Self::ResetPassword(_) => TokenKind::PasswordReset,
        }
    }
}

/// Issues and consumes single-use, time-limited tokens.
#[derive(Clone)]
pub struct VerificationTokenManager<S> {
    store: S,
}

impl<S> VerificationTokenManager<S>
where
    S: CredentialStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "VerificationTokenManager::issue", skip(self))]
    pub async fn issue(
        &self,
        user_id: &UserId,
        kind: TokenKind,
    ) -> Result<IssuedVerificationToken, VerificationTokenError> {
        let token = RawToken::generate();
        let record = VerificationToken::new(*user_id, kind, token.hash());

        self.store.create_verification_token(&record).await?;

        Ok(IssuedVerificationToken {
            token,
            expires_at: record.expires_at,
        })
    }

    /// Looks a presented token up by hash and checks it is still redeemable.
    ///
    /// Does not consume the token; pair with [`Self::redeem`].
    #[tracing::instrument(name = "VerificationTokenManager::validate", skip(self, presented))]
    pub async fn validate(
        &self,
        presented: &RawToken,
        kind: TokenKind,
    ) -> Result<VerificationToken, VerificationTokenError> {
        let record = self
            .store
            .get_verification_token(kind, &presented.hash())
            .await?
            .ok_or(VerificationTokenError::InvalidOrExpiredToken)?;

        if record.used {
            return Err(VerificationTokenError::TokenAlreadyUsed);
        }
        if record.is_expired_at(Utc::now()) {
            return Err(VerificationTokenError::TokenExpired);
        }

        Ok(record)
    }

    /// Applies `effect` and marks `token` used in one step.
    ///
    /// A concurrent redemption that got there first surfaces as
    /// [`VerificationTokenError::TokenAlreadyUsed`] and nothing is applied.
    #[tracing::instrument(name = "VerificationTokenManager::redeem", skip_all, fields(token_id = %token.id))]
    pub async fn redeem(
        &self,
        token: &VerificationToken,
        effect: TokenEffect,
    ) -> Result<(), VerificationTokenError> {
        if effect.kind() != token.kind {
            return Err(VerificationTokenError::InvalidOrExpiredToken);
        }

        match effect {
            TokenEffect::VerifyEmail => {
                self.store
                    .redeem_email_verification(&token.id, &token.user_id)
                    .await?
            }
            TokenEffect::ResetPassword(new_hash) => {
                self.store
                    .redeem_password_reset(&token.id, &token.user_id, &new_hash)
                    .await?
            }
        }

        Ok(())
    }

    pub async fn consume(
        &self,
        presented: &RawToken,
        effect: TokenEffect,
    ) -> Result<VerificationToken, VerificationTokenError> {
        let token = self.validate(presented, effect.kind()).await?;
        self.redeem(&token, effect).await?;
        Ok(token)
    }
}
