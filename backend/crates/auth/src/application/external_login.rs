//! External Login Use Case
//!
//! Signs in a user authenticated by a third-party provider, creating and
//! linking the local account on first sight.

use std::sync::Arc;

use crate::application::session_tokens::{SessionTokens, issue_session_tokens};
use crate::application::token_issuer::TokenIssuer;
use crate::domain::entity::{external_login::ExternalLogin, user::User};
use crate::domain::repository::{ExternalLoginRepository, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Identity asserted by the provider after a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLoginInfo {
    /// Stable user id at the provider
    pub provider_key: String,
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
}

/// OAuth 2.0 authorization-code provider
#[trait_variant::make(ExternalIdentityProvider: Send)]
pub trait LocalExternalIdentityProvider {
    /// Scheme name used in routes and stored bindings, e.g. `Google`
    fn name(&self) -> &str;

    /// Where to send the browser to start the flow
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange the callback `code` for the user's identity
    async fn exchange_code(&self, code: &str) -> AuthResult<ExternalLoginInfo>;
}

pub struct ExternalLoginUseCase<U, E, T>
where
    U: UserRepository,
    E: ExternalLoginRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    external_repo: Arc<E>,
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
}

impl<U, E, T> ExternalLoginUseCase<U, E, T>
where
    U: UserRepository,
    E: ExternalLoginRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        external_repo: Arc<E>,
        token_repo: Arc<T>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            user_repo,
            external_repo,
            token_repo,
            issuer,
        }
    }

    pub async fn execute(
        &self,
        provider: &str,
        info: ExternalLoginInfo,
    ) -> AuthResult<SessionTokens> {
        let user = match self
            .external_repo
            .find_user_by_external_login(provider, &info.provider_key)
            .await?
        {
            Some(user) => user,
            None => self.create_and_link(provider, &info).await?,
        };

        let tokens = issue_session_tokens(self.token_repo.as_ref(), &self.issuer, user).await?;

        tracing::info!(user_id = %tokens.user.user_id, provider = %provider, "External login");

        Ok(tokens)
    }

    async fn create_and_link(&self, provider: &str, info: &ExternalLoginInfo) -> AuthResult<User> {
        let email = Email::new(&info.email).map_err(|_| {
            AuthError::ExternalLoginFailed("Provider did not return a valid email".to_string())
        })?;

        let user = match self.user_repo.find_user_by_email(&email).await? {
            Some(existing) => {
                // Linking to an existing account requires the provider to vouch for the email
                if !info.email_verified {
                    return Err(AuthError::ExternalLoginFailed(
                        "Email is not verified by the provider".to_string(),
                    ));
                }
                existing
            }
            None => self.create_user(email, info).await?,
        };

        let login = ExternalLogin::new(provider, &info.provider_key, provider, user.user_id);
        self.external_repo
            .link_external_login(&login)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.user_id, error = %e, "Failed to link external login");
                AuthError::ExternalLoginFailed("Failed to link external login".to_string())
            })?;

        tracing::info!(user_id = %user.user_id, provider = %provider, "External login linked");

        Ok(user)
    }

    async fn create_user(&self, email: Email, info: &ExternalLoginInfo) -> AuthResult<User> {
        let user_name = UserName::new(email.local_part())
            .map_err(|e| AuthError::ExternalLoginFailed(e.to_string()))?;

        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::ExternalLoginFailed(format!(
                "Username '{}' is already taken.",
                user_name
            )));
        }

        let mut user = User::new_external(email, user_name);
        user.email_confirmed = info.email_verified;
        user.display_name = info.display_name.clone();

        self.user_repo.create_user(&user).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create external user");
            AuthError::ExternalLoginFailed("Failed to create user".to_string())
        })?;

        tracing::info!(user_id = %user.user_id, "External user created");

        Ok(user)
    }
}
