//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    email_confirmation::EmailConfirmation, external_login::ExternalLogin,
    refresh_token::RefreshToken, user::User,
};
use crate::domain::repository::{
    EmailConfirmationRepository, ExternalLoginRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email, user_id::UserId, user_name::UserName, user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

const USERS_EMAIL_KEY: &str = "users_email_key";
const USERS_USER_NAME_KEY: &str = "users_user_name_canonical_key";

/// Map unique violations on `users` to the matching domain error
fn user_write_error(err: sqlx::Error, user: &User) -> AuthError {
    let constraint = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    };
    match constraint {
        Some(USERS_EMAIL_KEY) => AuthError::UserAlreadyExists,
        Some(USERS_USER_NAME_KEY) => AuthError::duplicate_user_name(&user.user_name),
        _ => AuthError::Database(err),
    }
}

const USER_COLUMNS: &str = r#"
    u.user_id,
    u.email,
    u.user_name,
    u.password_hash,
    u.email_confirmed,
    u.display_name,
    u.bio,
    u.avatar,
    u.created_at,
    u.updated_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove refresh tokens and confirmations that expired more than a day ago
    ///
    /// Returns (refresh tokens deleted, confirmations deleted).
    pub async fn cleanup_expired(&self) -> AuthResult<(u64, u64)> {
        let cutoff = Utc::now() - chrono::Duration::days(1);

        let tokens = self.delete_expired_refresh_tokens(cutoff).await?;

        let confirmations = sqlx::query("DELETE FROM email_confirmations WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok((tokens, confirmations))
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                user_name,
                user_name_canonical,
                password_hash,
                email_confirmed,
                display_name,
                bio,
                avatar,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.password_hash.as_ref().map(|p| p.as_phc_string()))
        .bind(user.email_confirmed)
        .bind(user.display_name.as_deref())
        .bind(user.bio.as_deref())
        .bind(user.avatar.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| user_write_error(e, user))?;

        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                user_name = $2,
                user_name_canonical = $3,
                password_hash = $4,
                email_confirmed = $5,
                display_name = $6,
                bio = $7,
                avatar = $8,
                updated_at = $9
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.password_hash.as_ref().map(|p| p.as_phc_string()))
        .bind(user.email_confirmed)
        .bind(user.display_name.as_deref())
        .bind(user.bio.as_deref())
        .bind(user.avatar.as_deref())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| user_write_error(e, user))?;

        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn save_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id,
                user_id,
                token,
                created_at,
                expires_at,
                revoked_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_refresh_tokens(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>> {
        let rows = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, user_id, token, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RefreshTokenRow::into_token).collect())
    }

    async fn revoke_refresh_token_if_active(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        // Single conditional UPDATE: the row lock serializes racing rotations
        let affected = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2
            WHERE token = $1
              AND revoked_at IS NULL
              AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    async fn delete_expired_refresh_tokens(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// External Login Repository Implementation
// ============================================================================

impl ExternalLoginRepository for PgAuthRepository {
    async fn link_external_login(&self, login: &ExternalLogin) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO external_logins (
                provider,
                provider_key,
                provider_display_name,
                user_id,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&login.provider)
        .bind(&login.provider_key)
        .bind(&login.provider_display_name)
        .bind(login.user_id.as_uuid())
        .bind(login.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user_by_external_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            INNER JOIN external_logins l ON l.user_id = u.user_id
            WHERE l.provider = $1 AND l.provider_key = $2
            "#
        ))
        .bind(provider)
        .bind(provider_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }
}

// ============================================================================
// Email Confirmation Repository Implementation
// ============================================================================

impl EmailConfirmationRepository for PgAuthRepository {
    async fn save_email_confirmation(&self, confirmation: &EmailConfirmation) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO email_confirmations (
                id,
                user_id,
                token_hash,
                created_at,
                expires_at,
                consumed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(confirmation.id)
        .bind(confirmation.user_id.as_uuid())
        .bind(&confirmation.token_hash)
        .bind(confirmation.created_at)
        .bind(confirmation.expires_at)
        .bind(confirmation.consumed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_email_confirmations(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Vec<EmailConfirmation>> {
        let rows = sqlx::query_as::<_, EmailConfirmationRow>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, consumed_at
            FROM email_confirmations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(EmailConfirmationRow::into_confirmation)
            .collect())
    }

    async fn consume_email_confirmation(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<bool> {
        let affected = sqlx::query(
            "UPDATE email_confirmations SET consumed_at = $2 WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    user_name: String,
    password_hash: Option<String>,
    email_confirmed: bool,
    display_name: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = self
            .password_hash
            .map(UserPassword::from_phc_string)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            user_name: UserName::from_db(self.user_name),
            password_hash,
            email_confirmed: self.email_confirmed,
            display_name: self.display_name,
            bio: self.bio,
            avatar: self.avatar,
            refresh_tokens: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            id: self.id,
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            created_at: self.created_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EmailConfirmationRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: Vec<u8>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
}

impl EmailConfirmationRow {
    fn into_confirmation(self) -> EmailConfirmation {
        EmailConfirmation {
            id: self.id,
            user_id: UserId::from_uuid(self.user_id),
            token_hash: self.token_hash,
            created_at: self.created_at,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
        }
    }
}
