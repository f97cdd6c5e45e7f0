//! Refresh Token Entity
//!
//! One row of a user's refresh token ledger. Tokens are revoked when
//! superseded and never brought back to life.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: UserId,
    /// Signed JWT exactly as handed to the client
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn new(
        user_id: UserId,
        token: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            created_at,
            expires_at,
            revoked_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Not revoked and not expired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Mark revoked; a token that is already revoked keeps its first timestamp
    pub fn revoke(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_revoked() {
            return false;
        }
        self.revoked_at = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(now: DateTime<Utc>) -> RefreshToken {
        RefreshToken::new(UserId::new(), "t".to_string(), now, now + Duration::days(7))
    }

    #[test]
    fn test_fresh_token_is_active() {
        let now = Utc::now();
        let t = token(now);
        assert!(t.is_active_at(now));
        assert!(!t.is_expired_at(now));
    }

    #[test]
    fn test_expired_at_boundary() {
        let now = Utc::now();
        let t = token(now);
        assert!(t.is_expired_at(t.expires_at));
        assert!(!t.is_active_at(t.expires_at));
        assert!(t.is_active_at(t.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn test_revoked_is_inactive_and_not_resurrected() {
        let now = Utc::now();
        let mut t = token(now);
        assert!(t.revoke(now));
        assert!(!t.is_active_at(now));

        let later = now + Duration::minutes(5);
        assert!(!t.revoke(later));
        assert_eq!(t.revoked_at, Some(now));
    }
}
