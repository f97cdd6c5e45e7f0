//! Email Confirmation Entity
//!
//! Only the SHA-256 hash of the confirmation token is stored; the raw token
//! travels in the emailed link.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::{constant_time_eq, random_bytes, sha256};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

/// Raw token length in bytes (256 bits)
pub const CONFIRMATION_TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfirmation {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl EmailConfirmation {
    /// Generate a fresh token; returns the record and the raw token bytes
    pub fn issue(user_id: UserId, ttl: Duration) -> (Self, Vec<u8>) {
        let raw = random_bytes(CONFIRMATION_TOKEN_LEN);
        let now = Utc::now();
        let confirmation = Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash: sha256(&raw).to_vec(),
            created_at: now,
            expires_at: now + ttl,
            consumed_at: None,
        };
        (confirmation, raw)
    }

    pub fn matches(&self, raw: &[u8]) -> bool {
        constant_time_eq(&self.token_hash, &sha256(raw))
    }

    /// Unconsumed and not yet expired
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_stores_hash_not_token() {
        let (confirmation, raw) = EmailConfirmation::issue(UserId::new(), Duration::hours(24));
        assert_eq!(raw.len(), CONFIRMATION_TOKEN_LEN);
        assert_ne!(confirmation.token_hash, raw);
        assert!(confirmation.matches(&raw));
        assert!(!confirmation.matches(b"something else"));
    }

    #[test]
    fn test_usability() {
        let (mut confirmation, _) = EmailConfirmation::issue(UserId::new(), Duration::hours(24));
        let now = Utc::now();
        assert!(confirmation.is_usable_at(now));
        assert!(!confirmation.is_usable_at(now + Duration::hours(25)));

        confirmation.consumed_at = Some(now);
        assert!(!confirmation.is_usable_at(now));
    }
}
