//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (PostgreSQL and in-memory).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{
    email_confirmation::EmailConfirmation, external_login::ExternalLogin,
    refresh_token::RefreshToken, user::User,
};
use crate::domain::value_object::{email::Email, user_id::UserId, user_name::UserName};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user (fails on duplicate email)
    async fn create_user(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID (without refresh tokens)
    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by normalized email (without refresh tokens)
    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Case-insensitive user name check
    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    /// Persist credentials, confirmation flag and profile fields
    async fn update_user(&self, user: &User) -> AuthResult<()>;
}

/// Refresh token ledger
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    async fn save_refresh_token(&self, token: &RefreshToken) -> AuthResult<()>;

    /// All tokens ever issued to the user, newest first
    async fn find_refresh_tokens(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>>;

    /// Revoke only if not yet revoked
    ///
    /// Returns `true` when this call performed the revocation. Two callers
    /// racing on the same token see exactly one `true`.
    async fn revoke_refresh_token_if_active(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// Delete tokens that expired before `before`
    async fn delete_expired_refresh_tokens(&self, before: DateTime<Utc>) -> AuthResult<u64>;
}

/// Provider identity bindings
#[trait_variant::make(ExternalLoginRepository: Send)]
pub trait LocalExternalLoginRepository {
    /// Fails if (provider, provider_key) is already bound
    async fn link_external_login(&self, login: &ExternalLogin) -> AuthResult<()>;

    async fn find_user_by_external_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> AuthResult<Option<User>>;
}

/// Email confirmation tokens
#[trait_variant::make(EmailConfirmationRepository: Send)]
pub trait LocalEmailConfirmationRepository {
    async fn save_email_confirmation(&self, confirmation: &EmailConfirmation) -> AuthResult<()>;

    async fn find_email_confirmations(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Vec<EmailConfirmation>>;

    /// Mark consumed only if still unconsumed; `true` when this call consumed it
    async fn consume_email_confirmation(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<bool>;
}

/// Everything the HTTP layer needs from a backing store
pub trait AuthStore:
    UserRepository
    + RefreshTokenRepository
    + ExternalLoginRepository
    + EmailConfirmationRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + RefreshTokenRepository
        + ExternalLoginRepository
        + EmailConfirmationRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
