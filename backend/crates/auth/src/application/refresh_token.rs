//! Refresh Token Rotation Use Case
//!
//! One token in, one token out: the presented token is revoked before a new
//! pair is issued, and revocation is a compare-and-swap so concurrent
//! rotations of the same token cannot both succeed.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::session_tokens::{SessionTokens, issue_session_tokens};
use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct RefreshTokenUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<U, T> RefreshTokenUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            issuer,
            config,
        }
    }

    /// `presented` is the raw refresh cookie value, if any
    pub async fn execute(&self, presented: Option<&str>) -> AuthResult<SessionTokens> {
        let presented = presented
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::RefreshTokenMissing)?;

        let claims = self
            .issuer
            .validate_refresh_token(presented)
            .ok_or(AuthError::RefreshTokenInvalid)?;

        let email = Email::new(&claims.email).map_err(|_| AuthError::RefreshTokenRejected)?;
        let mut user = self
            .user_repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::RefreshTokenRejected)?;
        user.refresh_tokens = self.token_repo.find_refresh_tokens(&user.user_id).await?;

        let now = Utc::now();
        match user.find_refresh_token(presented) {
            Some(stored) if !stored.is_active_at(now) => {
                tracing::warn!(user_id = %user.user_id, revoked = stored.is_revoked(), "Inactive refresh token presented");
                return Err(AuthError::RefreshTokenRejected);
            }
            Some(_) => {
                if !self
                    .token_repo
                    .revoke_refresh_token_if_active(presented, now)
                    .await?
                {
                    tracing::warn!(user_id = %user.user_id, "Refresh token already rotated by a concurrent request");
                    return Err(AuthError::RefreshTokenRejected);
                }
            }
            None if self.config.refresh_policy.allow_unrecorded => {
                tracing::debug!(user_id = %user.user_id, "Rotating unrecorded refresh token");
            }
            None => {
                tracing::warn!(user_id = %user.user_id, "Unrecorded refresh token presented");
                return Err(AuthError::RefreshTokenRejected);
            }
        }

        user.refresh_tokens.clear();
        let tokens = issue_session_tokens(self.token_repo.as_ref(), &self.issuer, user).await?;

        tracing::info!(user_id = %tokens.user.user_id, "Refresh token rotated");

        Ok(tokens)
    }
}
