//! Login Use Case
//!
//! Password sign-in. Unknown email, password-less account and wrong password
//! all fail with the same `InvalidCredentials`.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_tokens::{SessionTokens, issue_session_tokens};
use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<U, T> LoginUseCase<U, T>
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

    pub async fn execute(&self, input: LoginInput) -> AuthResult<SessionTokens> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let raw_password = RawPassword::new(input.password);

        let user = self
            .user_repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_valid = user
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&raw_password, self.config.pepper()));

        if !password_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = issue_session_tokens(self.token_repo.as_ref(), &self.issuer, user).await?;

        tracing::info!(user_id = %tokens.user.user_id, "User logged in");

        Ok(tokens)
    }
}
