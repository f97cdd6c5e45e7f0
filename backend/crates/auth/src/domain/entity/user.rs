//! User Entity
//!
//! Account record: identity, credentials, profile fields and the refresh
//! tokens issued to it.

use chrono::{DateTime, Utc};

use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::value_object::{
    email::Email, user_id::UserId, user_name::UserName, user_password::UserPassword,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, lower-cased
    pub email: Email,
    pub user_name: UserName,
    /// `None` for accounts that only sign in through an external provider
    pub password_hash: Option<UserPassword>,
    pub email_confirmed: bool,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    /// URL of an already-hosted image
    pub avatar: Option<String>,
    /// Refresh token ledger; populated only when loaded explicitly
    pub refresh_tokens: Vec<RefreshToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Local registration: the email doubles as user name
    pub fn new_local(email: Email, password_hash: UserPassword) -> Self {
        let user_name = UserName::from_db(email.as_str());
        Self::build(email, user_name, Some(password_hash))
    }

    /// Federated account without a local password
    pub fn new_external(email: Email, user_name: UserName) -> Self {
        Self::build(email, user_name, None)
    }

    fn build(email: Email, user_name: UserName, password_hash: Option<UserPassword>) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            user_name,
            password_hash,
            email_confirmed: false,
            display_name: None,
            bio: None,
            avatar: None,
            refresh_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn set_password(&mut self, password_hash: UserPassword) {
        self.password_hash = Some(password_hash);
        self.updated_at = Utc::now();
    }

    pub fn confirm_email(&mut self) {
        self.email_confirmed = true;
        self.updated_at = Utc::now();
    }

    /// Ledger entry with exactly this token string
    pub fn find_refresh_token(&self, token: &str) -> Option<&RefreshToken> {
        self.refresh_tokens.iter().find(|t| t.token == token)
    }
}
