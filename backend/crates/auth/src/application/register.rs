//! Register Use Case
//!
//! Creates a local account and emails a confirmation link.

use std::sync::Arc;

use platform::crypto::to_base64url;

use crate::application::config::AuthConfig;
use crate::application::email::{EmailMessage, EmailSender, EmailTemplate};
use crate::domain::entity::{email_confirmation::EmailConfirmation, user::User};
use crate::domain::repository::{EmailConfirmationRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

pub struct RegisterOutput {
    pub user: User,
}

pub struct RegisterUseCase<U, C>
where
    U: UserRepository,
    C: EmailConfirmationRepository,
{
    user_repo: Arc<U>,
    confirmation_repo: Arc<C>,
    email_sender: Arc<dyn EmailSender>,
    config: Arc<AuthConfig>,
}

impl<U, C> RegisterUseCase<U, C>
where
    U: UserRepository,
    C: EmailConfirmationRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        confirmation_repo: Arc<C>,
        email_sender: Arc<dyn EmailSender>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            confirmation_repo,
            email_sender,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let email = Email::new(&input.email)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let raw_password = RawPassword::validated(input.password, &self.config.password_policy)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let user = User::new_local(email, password_hash);
        // A concurrent registration of the same email surfaces as UserAlreadyExists
        self.user_repo.create_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "User registered");

        self.send_confirmation(&user).await?;

        Ok(RegisterOutput { user })
    }

    /// Store a new confirmation token and email the link
    ///
    /// Delivery failures are logged; the account already exists.
    async fn send_confirmation(&self, user: &User) -> AuthResult<()> {
        let (confirmation, raw_token) =
            EmailConfirmation::issue(user.user_id, self.config.email_confirmation_ttl());
        self.confirmation_repo
            .save_email_confirmation(&confirmation)
            .await?;

        let confirmation_link = confirmation_link(
            self.config.web_base_url(),
            user.email.as_str(),
            &to_base64url(&raw_token),
        );
        let message = EmailMessage::new(
            &user.email,
            EmailTemplate::ConfirmEmail { confirmation_link },
        );

        if let Err(e) = self.email_sender.send(&message) {
            tracing::error!(user_id = %user.user_id, error = %e, "Failed to send confirmation email");
        }

        Ok(())
    }
}

/// `{web_base_url}/confirm-email?email=..&token=..`
pub fn confirmation_link(web_base_url: &str, email: &str, token: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("email", email)
        .append_pair("token", token)
        .finish();
    format!("{web_base_url}/confirm-email?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_link_is_query_encoded() {
        let link = confirmation_link("https://app.example.com", "a+b@x.com", "abc-_");
        assert_eq!(
            link,
            "https://app.example.com/confirm-email?email=a%2Bb%40x.com&token=abc-_"
        );
    }
}
