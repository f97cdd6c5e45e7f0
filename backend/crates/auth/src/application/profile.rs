//! Profile Use Cases
//!
//! Read and partially update the authenticated user's public profile.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Public profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_name: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            user_name: user.user_name.original().to_string(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Fields absent or blank are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct ProfileUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn get(&self, user_id: &UserId) -> AuthResult<Profile> {
        let user = self
            .user_repo
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Profile::from(&user))
    }

    pub async fn update(&self, user_id: &UserId, update: ProfileUpdate) -> AuthResult<Profile> {
        let mut user = self
            .user_repo
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(raw) = non_blank(update.user_name) {
            let user_name = UserName::new(&raw)?;
            // Local accounts are named after their email, so an email-shaped
            // name is reserved for the owner of that email
            if user_name.canonical().contains('@')
                && user_name.canonical() != user.email.as_str()
            {
                return Err(AuthError::field(
                    "InvalidUserName",
                    "Username can only contain '@' when it is your own email.",
                ));
            }
            if user_name.canonical() != user.user_name.canonical()
                && self.user_repo.exists_by_user_name(&user_name).await?
            {
                return Err(AuthError::duplicate_user_name(&user_name));
            }
            user.user_name = user_name;
        }
        if let Some(display_name) = non_blank(update.display_name) {
            user.display_name = Some(display_name);
        }
        if let Some(bio) = non_blank(update.bio) {
            user.bio = Some(bio);
        }
        if let Some(avatar) = non_blank(update.avatar) {
            user.avatar = Some(avatar);
        }
        user.updated_at = Utc::now();

        self.user_repo.update_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "Profile updated");

        Ok(Profile::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" hi ".to_string())), Some("hi".to_string()));
    }
}
