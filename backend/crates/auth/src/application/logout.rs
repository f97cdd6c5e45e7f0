//! Logout Use Case
//!
//! Revokes the presented refresh token when it is recorded and still
//! active. Cookie clearing is the HTTP layer's job and happens regardless.

use std::sync::Arc;

use chrono::Utc;

use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::RefreshTokenRepository;
use crate::error::AuthResult;

pub struct LogoutUseCase<T>
where
    T: RefreshTokenRepository,
{
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
}

impl<T> LogoutUseCase<T>
where
    T: RefreshTokenRepository,
{
    pub fn new(token_repo: Arc<T>, issuer: Arc<TokenIssuer>) -> Self {
        Self { token_repo, issuer }
    }

    /// Returns whether a token was revoked
    pub async fn execute(&self, presented: &str) -> AuthResult<bool> {
        // Forged tokens never reach the store
        if self.issuer.validate_refresh_token(presented).is_none() {
            return Ok(false);
        }

        let revoked = self
            .token_repo
            .revoke_refresh_token_if_active(presented, Utc::now())
            .await?;

        if revoked {
            tracing::info!("Refresh token revoked on logout");
        }

        Ok(revoked)
    }
}
