//! External Login Entity
//!
//! Binds a provider identity (provider name + provider-side user key) to a
//! local user. The pair is unique.

use chrono::{DateTime, Utc};

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLogin {
    /// Provider scheme, e.g. `Google`
    pub provider: String,
    /// Stable user id at the provider (`sub`)
    pub provider_key: String,
    pub provider_display_name: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl ExternalLogin {
    pub fn new(
        provider: impl Into<String>,
        provider_key: impl Into<String>,
        provider_display_name: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            provider: provider.into(),
            provider_key: provider_key.into(),
            provider_display_name: provider_display_name.into(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
