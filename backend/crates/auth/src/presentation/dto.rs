//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::application::profile::Profile;
use crate::application::session_tokens::SessionTokens;
use crate::domain::entity::user::User;

// ============================================================================
// Register / Login
// ============================================================================

/// Register and login request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Query of the emailed confirmation link
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmEmailQuery {
    pub email: String,
    pub token: String,
}

/// User summary returned with tokens
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub email_confirmed: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.as_str().to_string(),
            user_name: user.user_name.original().to_string(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
            email_confirmed: user.email_confirmed,
        }
    }
}

/// Login and refresh response; the refresh token travels in a cookie
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    /// RFC 3339
    pub expires: String,
    pub user: UserResponse,
}

pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&SessionTokens> for TokenResponse {
    fn from(tokens: &SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token.token.clone(),
            expires: rfc3339(tokens.access_token.expires_at),
            user: UserResponse::from(&tokens.user),
        }
    }
}

// ============================================================================
// External Login
// ============================================================================

/// Provider callback query
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user declined consent
    pub error: Option<String>,
}

// ============================================================================
// Password / Profile
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_name: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user_name: profile.user_name,
            display_name: profile.display_name,
            bio: profile.bio,
            avatar: profile.avatar,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
