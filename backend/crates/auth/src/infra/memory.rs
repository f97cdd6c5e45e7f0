//! In-Memory Repository Implementation
//!
//! Same semantics as the PostgreSQL store (unique email, unique user name,
//! conditional revocation) behind a single `tokio::sync::RwLock`. Used by
//! tests and local runs without a database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::{
    email_confirmation::EmailConfirmation, external_login::ExternalLogin,
    refresh_token::RefreshToken, user::User,
};
use crate::domain::repository::{
    EmailConfirmationRepository, ExternalLoginRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{email::Email, user_id::UserId, user_name::UserName};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    /// (provider, provider_key) -> user
    external_logins: HashMap<(String, String), ExternalLogin>,
    refresh_tokens: Vec<RefreshToken>,
    confirmations: Vec<EmailConfirmation>,
}

impl MemoryState {
    fn user_by_email(&self, email: &Email) -> Option<&User> {
        self.users.values().find(|u| u.email == *email)
    }

    fn user_name_taken(&self, user_name: &UserName, except: Option<UserId>) -> bool {
        self.users.values().any(|u| {
            u.user_name.canonical() == user_name.canonical() && Some(u.user_id) != except
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stored(user: &User) -> User {
    User {
        refresh_tokens: Vec::new(),
        ..user.clone()
    }
}

impl UserRepository for InMemoryAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.user_by_email(&user.email).is_some() {
            return Err(AuthError::UserAlreadyExists);
        }
        if state.user_name_taken(&user.user_name, None) {
            return Err(AuthError::duplicate_user_name(&user.user_name));
        }
        state.users.insert(user.user_id, stored(user));
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.state.read().await.user_by_email(email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.state.read().await.user_by_email(email).is_some())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        Ok(self.state.read().await.user_name_taken(user_name, None))
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.user_name_taken(&user.user_name, Some(user.user_id)) {
            return Err(AuthError::duplicate_user_name(&user.user_name));
        }
        match state.users.get_mut(&user.user_id) {
            Some(existing) => {
                *existing = stored(user);
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

impl RefreshTokenRepository for InMemoryAuthRepository {
    async fn save_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.refresh_tokens.iter().any(|t| t.token == token.token) {
            return Err(AuthError::Internal("Duplicate refresh token".to_string()));
        }
        state.refresh_tokens.push(token.clone());
        Ok(())
    }

    async fn find_refresh_tokens(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>> {
        let state = self.state.read().await;
        let mut tokens: Vec<_> = state
            .refresh_tokens
            .iter()
            .filter(|t| t.user_id == *user_id)
            .cloned()
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn revoke_refresh_token_if_active(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token == token)
            .filter(|t| t.is_active_at(at))
            .is_some_and(|t| t.revoke(at)))
    }

    async fn delete_expired_refresh_tokens(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.state.write().await;
        let len = state.refresh_tokens.len();
        state.refresh_tokens.retain(|t| t.expires_at >= before);
        Ok((len - state.refresh_tokens.len()) as u64)
    }
}

impl ExternalLoginRepository for InMemoryAuthRepository {
    async fn link_external_login(&self, login: &ExternalLogin) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&login.user_id) {
            return Err(AuthError::UserNotFound);
        }
        let key = (login.provider.clone(), login.provider_key.clone());
        if state.external_logins.contains_key(&key) {
            return Err(AuthError::Internal("External login already linked".to_string()));
        }
        state.external_logins.insert(key, login.clone());
        Ok(())
    }

    async fn find_user_by_external_login(
        &self,
        provider: &str,
        provider_key: &str,
    ) -> AuthResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .external_logins
            .get(&(provider.to_string(), provider_key.to_string()))
            .and_then(|login| state.users.get(&login.user_id))
            .cloned())
    }
}

impl EmailConfirmationRepository for InMemoryAuthRepository {
    async fn save_email_confirmation(&self, confirmation: &EmailConfirmation) -> AuthResult<()> {
        self.state
            .write()
            .await
            .confirmations
            .push(confirmation.clone());
        Ok(())
    }

    async fn find_email_confirmations(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Vec<EmailConfirmation>> {
        let state = self.state.read().await;
        Ok(state
            .confirmations
            .iter()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn consume_email_confirmation(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<bool> {
        let mut state = self.state.write().await;
        match state
            .confirmations
            .iter_mut()
            .find(|c| c.id == id && c.consumed_at.is_none())
        {
            Some(confirmation) => {
                confirmation.consumed_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(email: &str) -> User {
        User::new_external(
            Email::new(email).unwrap(),
            UserName::new(email.split('@').next().unwrap()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryAuthRepository::new();
        repo.create_user(&user("a@x.com")).await.unwrap();

        let mut dup = user("A@X.com");
        dup.user_name = UserName::new("other").unwrap();
        assert!(matches!(
            repo.create_user(&dup).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_user_name_is_a_validation_error() {
        let repo = InMemoryAuthRepository::new();
        repo.create_user(&user("ann@x.com")).await.unwrap();

        let dup = user("ANN@y.com");
        match repo.create_user(&dup).await {
            Err(AuthError::Validation(details)) => {
                assert_eq!(details[0].code, "DuplicateUserName");
            }
            other => panic!("expected DuplicateUserName, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_revoke_is_compare_and_swap() {
        let repo = InMemoryAuthRepository::new();
        let u = user("a@x.com");
        repo.create_user(&u).await.unwrap();

        let now = Utc::now();
        let token = RefreshToken::new(u.user_id, "tok".to_string(), now, now + Duration::days(7));
        repo.save_refresh_token(&token).await.unwrap();

        assert!(repo.revoke_refresh_token_if_active("tok", now).await.unwrap());
        assert!(!repo.revoke_refresh_token_if_active("tok", now).await.unwrap());
        assert!(!repo.revoke_refresh_token_if_active("unknown", now).await.unwrap());

        let tokens = repo.find_refresh_tokens(&u.user_id).await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_revoked());
    }

    #[tokio::test]
    async fn test_expired_token_cannot_be_revoked_or_survive_cleanup() {
        let repo = InMemoryAuthRepository::new();
        let u = user("a@x.com");
        repo.create_user(&u).await.unwrap();

        let past = Utc::now() - Duration::days(10);
        let token = RefreshToken::new(u.user_id, "old".to_string(), past, past + Duration::days(7));
        repo.save_refresh_token(&token).await.unwrap();

        assert!(!repo.revoke_refresh_token_if_active("old", Utc::now()).await.unwrap());
        assert_eq!(repo.delete_expired_refresh_tokens(Utc::now()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_external_login_lookup() {
        let repo = InMemoryAuthRepository::new();
        let u = user("a@x.com");
        repo.create_user(&u).await.unwrap();

        let login = ExternalLogin::new("Google", "sub-1", "Google", u.user_id);
        repo.link_external_login(&login).await.unwrap();
        assert!(repo.link_external_login(&login).await.is_err());

        let found = repo
            .find_user_by_external_login("Google", "sub-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, u.user_id);
        assert!(repo
            .find_user_by_external_login("Google", "sub-2")
            .await
            .unwrap()
            .is_none());
    }
}
