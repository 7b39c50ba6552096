use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, ser::SerializeStruct};
use uuid::Uuid;
use warden_core::{
    AccessClaims, AccessToken, CredentialStore, CredentialStoreError, Email, IssuedRefreshToken,
    RawToken, RefreshToken, TokenIssuer, TokenIssuerError, UserId,
};

use crate::config::constants::{DEFAULT_JWT_AUDIENCE, DEFAULT_JWT_ISSUER};

#[derive(Clone)]
pub struct JwtTokenConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl JwtTokenConfig {
    /// Fifteen minute access tokens and seven day refresh tokens.
    pub fn new(secret: Secret<String>) -> Self {
        Self {
            secret,
            issuer: DEFAULT_JWT_ISSUER.to_owned(),
            audience: DEFAULT_JWT_AUDIENCE.to_owned(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

/// HS256 access tokens plus opaque refresh tokens persisted by hash in `S`.
#[derive(Clone)]
pub struct JwtTokenIssuer<S> {
    store: S,
    config: JwtTokenConfig,
}

impl<S> JwtTokenIssuer<S> {
    pub fn new(store: S, config: JwtTokenConfig) -> Self {
        Self { store, config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub email: Secret<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Serialize for Claims {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Claims", 7)?;
        state.serialize_field("sub", &self.sub)?;
        state.serialize_field("user_id", &self.user_id)?;
        state.serialize_field("email", &self.email.expose_secret())?;
        state.serialize_field("iat", &self.iat)?;
        state.serialize_field("exp", &self.exp)?;
        state.serialize_field("iss", &self.iss)?;
        state.serialize_field("aud", &self.aud)?;
        state.end()
    }
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> TokenIssuerError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenIssuerError::ExpiredToken,
        _ => TokenIssuerError::InvalidToken,
    }
}

// Losing a concurrent rotation or revocation looks the same as presenting a dead token.
fn map_store_error(e: CredentialStoreError) -> TokenIssuerError {
    match e {
        CredentialStoreError::NotFound => TokenIssuerError::InvalidToken,
        other => TokenIssuerError::StoreError(other),
    }
}

impl<S: CredentialStore> JwtTokenIssuer<S> {
    async fn live_refresh_token(
        &self,
        presented: &RawToken,
    ) -> Result<RefreshToken, TokenIssuerError> {
        let record = self
            .store
            .get_refresh_token(&presented.hash())
            .await?
            .ok_or(TokenIssuerError::InvalidToken)?;

        if record.revoked {
            tracing::warn!(user_id = %record.user_id, "Revoked refresh token presented");
            return Err(TokenIssuerError::InvalidToken);
        }
        if !record.is_usable_at(Utc::now()) {
            return Err(TokenIssuerError::ExpiredToken);
        }

        Ok(record)
    }
}

#[async_trait]
impl<S: CredentialStore> TokenIssuer for JwtTokenIssuer<S> {
    #[tracing::instrument(name = "Generating access token", skip_all)]
    fn generate_access_token(
        &self,
        user_id: &UserId,
        email: &Email,
    ) -> Result<AccessToken, TokenIssuerError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.access_token_ttl)
            .ok_or(TokenIssuerError::UnexpectedError(
                "Duration out of range".to_string(),
            ))?;

        let claims = Claims {
            sub: user_id.to_string(),
            user_id: user_id.to_string(),
            email: email.as_ref().clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.as_bytes()),
        )
        .map_err(|e| TokenIssuerError::UnexpectedError(e.to_string()))?;

        Ok(AccessToken {
            token: Secret::new(token),
            expires_at,
        })
    }

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, TokenIssuerError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.as_bytes()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(map_decode_error)?;

        let user_id = Uuid::parse_str(&claims.user_id)
            .map(UserId::from)
            .map_err(|_| TokenIssuerError::InvalidToken)?;
        let email = Email::try_from(claims.email).map_err(|_| TokenIssuerError::InvalidToken)?;
        let expires_at: DateTime<Utc> =
            DateTime::from_timestamp(claims.exp, 0).ok_or(TokenIssuerError::InvalidToken)?;

        Ok(AccessClaims {
            user_id,
            email,
            expires_at,
        })
    }

    #[tracing::instrument(name = "Issuing refresh token", skip_all)]
    async fn generate_and_store_refresh_token(
        &self,
        user_id: &UserId,
    ) -> Result<IssuedRefreshToken, TokenIssuerError> {
        let token = RawToken::generate();
        let record = RefreshToken::new(*user_id, token.hash(), self.config.refresh_token_ttl);

        self.store.create_refresh_token(&record).await?;

        Ok(IssuedRefreshToken {
            token,
            expires_at: record.expires_at,
        })
    }

    #[tracing::instrument(name = "Rotating refresh token", skip_all)]
    async fn rotate_refresh_token(
        &self,
        presented: &RawToken,
    ) -> Result<(UserId, IssuedRefreshToken), TokenIssuerError> {
        let current = self.live_refresh_token(presented).await?;

        let token = RawToken::generate();
        let replacement =
            RefreshToken::new(current.user_id, token.hash(), self.config.refresh_token_ttl);

        self.store
            .rotate_refresh_token(&current.id, &replacement)
            .await
            .map_err(map_store_error)?;

        Ok((
            current.user_id,
            IssuedRefreshToken {
                token,
                expires_at: replacement.expires_at,
            },
        ))
    }

    #[tracing::instrument(name = "Revoking refresh token", skip_all)]
    async fn revoke_refresh_token(&self, presented: &RawToken) -> Result<(), TokenIssuerError> {
        let record = self
            .store
            .get_refresh_token(&presented.hash())
            .await?
            .ok_or(TokenIssuerError::InvalidToken)?;

        self.store
            .revoke_refresh_token(&record.id)
            .await
            .map_err(map_store_error)
    }
}
