//! Confirm Email Use Case

use std::sync::Arc;

use chrono::Utc;
use platform::crypto::from_base64url;

use crate::domain::repository::{EmailConfirmationRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct ConfirmEmailUseCase<U, C>
where
    U: UserRepository,
    C: EmailConfirmationRepository,
{
    user_repo: Arc<U>,
    confirmation_repo: Arc<C>,
}

impl<U, C> ConfirmEmailUseCase<U, C>
where
    U: UserRepository,
    C: EmailConfirmationRepository,
{
    pub fn new(user_repo: Arc<U>, confirmation_repo: Arc<C>) -> Self {
        Self {
            user_repo,
            confirmation_repo,
        }
    }

    /// `token` is the base64url value from the emailed link
    pub async fn execute(&self, email: &str, token: &str) -> AuthResult<()> {
        let raw_token = from_base64url(token).map_err(|_| AuthError::TokenInvalid)?;

        let email = Email::new(email).map_err(|_| AuthError::UserNotFound)?;
        let mut user = self
            .user_repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let now = Utc::now();
        let confirmation = self
            .confirmation_repo
            .find_email_confirmations(&user.user_id)
            .await?
            .into_iter()
            .find(|c| c.is_usable_at(now) && c.matches(&raw_token))
            .ok_or(AuthError::TokenInvalid)?;

        if !self
            .confirmation_repo
            .consume_email_confirmation(confirmation.id, now)
            .await?
        {
            return Err(AuthError::TokenInvalid);
        }

        if !user.email_confirmed {
            user.confirm_email();
            self.user_repo.update_user(&user).await?;
        }

        tracing::info!(user_id = %user.user_id, "Email confirmed");

        Ok(())
    }
}
