use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use warden_core::{
    CredentialStore, CredentialStoreError, Email, PasswordHash, PersonName, PhoneHash,
    PhoneNumber, RefreshToken, TokenHash, TokenKind, User, UserId, VerificationToken,
};

const USERS_EMAIL_CONSTRAINT: &str = "users_email_unique";
const USERS_PHONE_HASH_CONSTRAINT: &str = "users_phone_number_hash_unique";

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone_number, \
     phone_number_hash, email_verified, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresCredentialStore { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    phone_number_hash: String,
    email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CredentialStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |e: warden_core::ValidationError| {
            CredentialStoreError::UnexpectedError(format!("stored user {} is invalid: {e}", row.id))
        };

        let mut user = User::new(
            Email::try_from(Secret::new(row.email.clone())).map_err(corrupt)?,
            PasswordHash::new(Secret::new(row.password_hash.clone())),
            PersonName::parse(&row.first_name).map_err(corrupt)?,
            PersonName::parse(&row.last_name).map_err(corrupt)?,
            PhoneNumber::parse(&row.phone_number).map_err(corrupt)?,
        );
        user.id = UserId::from(row.id);
        user.phone_hash = PhoneHash::from_hex(row.phone_number_hash.clone());
        user.email_verified = row.email_verified;
        user.created_at = row.created_at;
        user.updated_at = row.updated_at;
        Ok(user)
    }
}

#[derive(sqlx::FromRow)]
struct VerificationTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

impl VerificationTokenRow {
    fn into_token(self, kind: TokenKind) -> VerificationToken {
        VerificationToken {
            id: self.id,
            user_id: UserId::from(self.user_id),
            kind,
            token_hash: TokenHash::from_hex(self.token_hash),
            expires_at: self.expires_at,
            used: self.used,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    created_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        RefreshToken {
            id: row.id,
            user_id: UserId::from(row.user_id),
            token_hash: TokenHash::from_hex(row.token_hash),
            expires_at: row.expires_at,
            revoked: row.revoked,
            created_at: row.created_at,
        }
    }
}

fn token_table(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::EmailVerification => "email_verification_tokens",
        TokenKind::PasswordReset => "password_reset_tokens",
    }
}

fn unexpected(e: sqlx::Error) -> CredentialStoreError {
    CredentialStoreError::UnexpectedError(e.to_string())
}

fn map_insert_error(e: sqlx::Error) -> CredentialStoreError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.constraint() {
            Some(USERS_EMAIL_CONSTRAINT) => return CredentialStoreError::DuplicateEmail,
            Some(USERS_PHONE_HASH_CONSTRAINT) => return CredentialStoreError::DuplicatePhone,
            _ => {}
        }
        if db_err.is_foreign_key_violation() {
            return CredentialStoreError::NotFound;
        }
    }
    unexpected(e)
}

/// Updates keyed by primary key must touch exactly one row.
fn expect_single_row(rows_affected: u64, operation: &str) -> Result<(), CredentialStoreError> {
    match rows_affected {
        0 => Err(CredentialStoreError::NotFound),
        1 => Ok(()),
        n => {
            tracing::error!(operation, rows_affected = n, "Update touched more than one row");
            Err(CredentialStoreError::InvariantViolation(format!(
                "{operation} affected {n} rows"
            )))
        }
    }
}

/// Like [`expect_single_row`] for the conditional `used = FALSE` update, where zero rows
/// means another caller already consumed the token.
fn expect_token_claimed(rows_affected: u64, operation: &str) -> Result<(), CredentialStoreError> {
    match expect_single_row(rows_affected, operation) {
        Err(CredentialStoreError::NotFound) => Err(CredentialStoreError::TokenAlreadyUsed),
        other => other,
    }
}

async fn claim_token(
    tx: &mut Transaction<'_, Postgres>,
    kind: TokenKind,
    token_id: &Uuid,
    user_id: &UserId,
) -> Result<(), CredentialStoreError> {
    let sql = format!(
        "UPDATE {} SET used = TRUE WHERE id = $1 AND user_id = $2 AND used = FALSE",
        token_table(kind)
    );
    let result = sqlx::query(&sql)
        .bind(token_id)
        .bind(user_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(unexpected)?;

    expect_token_claimed(result.rows_affected(), "claim verification token")
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn create_user(&self, user: &User) -> Result<(), CredentialStoreError> {
        sqlx::query(
            r#"
                INSERT INTO users (id, email, password_hash, first_name, last_name,
                                   phone_number, phone_number_hash, email_verified,
                                   created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_ref().expose_secret())
        .bind(user.password_hash().as_ref().expose_secret())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.phone_number.as_str())
        .bind(user.phone_hash.as_str())
        .bind(user.email_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving user by email from PostgreSQL", skip_all)]
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, CredentialStoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email.as_ref().expose_secret())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(name = "Retrieving user by id from PostgreSQL", skip_all)]
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<Option<User>, CredentialStoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(name = "Retrieving user by phone from PostgreSQL", skip_all)]
    async fn get_user_by_phone_hash(
        &self,
        phone_hash: &PhoneHash,
    ) -> Result<Option<User>, CredentialStoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number_hash = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(phone_hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        row.map(User::try_from).transpose()
    }

    #[tracing::instrument(name = "Updating password in PostgreSQL", skip_all)]
    async fn update_password(
        &self,
        user_id: &UserId,
        new_hash: &PasswordHash,
        updated_at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE users
                SET password_hash = $1, updated_at = $2
                WHERE id = $3
            "#,
        )
        .bind(new_hash.as_ref().expose_secret())
        .bind(updated_at)
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        expect_single_row(result.rows_affected(), "update password")
    }

    #[tracing::instrument(name = "Marking email verified in PostgreSQL", skip_all)]
    async fn set_email_verified(&self, user_id: &UserId) -> Result<(), CredentialStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE users
                SET email_verified = TRUE, updated_at = NOW()
                WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        expect_single_row(result.rows_affected(), "set email verified")
    }

    #[tracing::instrument(name = "Storing verification token in PostgreSQL", skip_all, fields(kind = token.kind.as_str()))]
    async fn create_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), CredentialStoreError> {
        let sql = format!(
            "INSERT INTO {} (id, user_id, token_hash, expires_at, used, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            token_table(token.kind)
        );
        sqlx::query(&sql)
            .bind(token.id)
            .bind(token.user_id.as_uuid())
            .bind(token.token_hash.as_str())
            .bind(token.expires_at)
            .bind(token.used)
            .bind(token.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_insert_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving verification token from PostgreSQL", skip(self, token_hash))]
    async fn get_verification_token(
        &self,
        kind: TokenKind,
        token_hash: &TokenHash,
    ) -> Result<Option<VerificationToken>, CredentialStoreError> {
        let sql = format!(
            "SELECT id, user_id, token_hash, expires_at, used, created_at \
             FROM {} WHERE token_hash = $1",
            token_table(kind)
        );
        let row: Option<VerificationTokenRow> = sqlx::query_as(&sql)
            .bind(token_hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(row.map(|row| row.into_token(kind)))
    }

    #[tracing::instrument(name = "Marking verification token used in PostgreSQL", skip(self))]
    async fn mark_verification_token_used(
        &self,
        kind: TokenKind,
        token_id: &Uuid,
    ) -> Result<(), CredentialStoreError> {
        let sql = format!(
            "UPDATE {} SET used = TRUE WHERE id = $1 AND used = FALSE",
            token_table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        expect_token_claimed(result.rows_affected(), "mark verification token used")
    }

    #[tracing::instrument(name = "Redeeming email verification in PostgreSQL", skip_all)]
    async fn redeem_email_verification(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
    ) -> Result<(), CredentialStoreError> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        claim_token(&mut tx, TokenKind::EmailVerification, token_id, user_id).await?;

        let result = sqlx::query(
            r#"
                UPDATE users
                SET email_verified = TRUE, updated_at = NOW()
                WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        expect_single_row(result.rows_affected(), "set email verified")?;

        tx.commit().await.map_err(unexpected)
    }

    #[tracing::instrument(name = "Redeeming password reset in PostgreSQL", skip_all)]
    async fn redeem_password_reset(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
        new_hash: &PasswordHash,
    ) -> Result<(), CredentialStoreError> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        claim_token(&mut tx, TokenKind::PasswordReset, token_id, user_id).await?;

        let result = sqlx::query(
            r#"
                UPDATE users
                SET password_hash = $1, updated_at = NOW()
                WHERE id = $2
            "#,
        )
        .bind(new_hash.as_ref().expose_secret())
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        expect_single_row(result.rows_affected(), "update password")?;

        tx.commit().await.map_err(unexpected)
    }

    #[tracing::instrument(name = "Storing refresh token in PostgreSQL", skip_all)]
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), CredentialStoreError> {
        sqlx::query(
            r#"
                INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.as_uuid())
        .bind(token.token_hash.as_str())
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    #[tracing::instrument(name = "Retrieving refresh token from PostgreSQL", skip_all)]
    async fn get_refresh_token(
        &self,
        token_hash: &TokenHash,
    ) -> Result<Option<RefreshToken>, CredentialStoreError> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"
                SELECT id, user_id, token_hash, expires_at, revoked, created_at
                FROM refresh_tokens
                WHERE token_hash = $1
            "#,
        )
        .bind(token_hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(row.map(RefreshToken::from))
    }

    #[tracing::instrument(name = "Revoking refresh token in PostgreSQL", skip_all)]
    async fn revoke_refresh_token(&self, token_id: &Uuid) -> Result<(), CredentialStoreError> {
        let result = sqlx::query(
            r#"
                UPDATE refresh_tokens
                SET revoked = TRUE
                WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        expect_single_row(result.rows_affected(), "revoke refresh token")
    }

    #[tracing::instrument(name = "Rotating refresh token in PostgreSQL", skip_all)]
    async fn rotate_refresh_token(
        &self,
        old_id: &Uuid,
        replacement: &RefreshToken,
    ) -> Result<(), CredentialStoreError> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let result = sqlx::query(
            r#"
                UPDATE refresh_tokens
                SET revoked = TRUE
                WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        expect_single_row(result.rows_affected(), "revoke refresh token")?;

        sqlx::query(
            r#"
                INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(replacement.id)
        .bind(replacement.user_id.as_uuid())
        .bind(replacement.token_hash.as_str())
        .bind(replacement.expires_at)
        .bind(replacement.revoked)
        .bind(replacement.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        tx.commit().await.map_err(unexpected)
    }
}
