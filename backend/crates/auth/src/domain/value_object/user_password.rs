//! User Password Value Object
//!
//! Domain wrapper around `platform::password`.
//!
//! - [`RawPassword`]: clear text from a request, zeroized on drop
//! - [`UserPassword`]: Argon2id PHC string, safe to store
//!
//! ```rust
//! use auth::domain::value_object::user_password::{RawPassword, UserPassword};
//! use platform::password::PasswordPolicy;
//!
//! let raw = RawPassword::validated("Abc123!!".to_string(), &PasswordPolicy::default()).unwrap();
//! let hashed = UserPassword::from_raw(&raw, None).unwrap();
//! assert!(hashed.verify(&raw, None));
//! ```

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicy};
use std::fmt;

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Wrap a presented password (login, current password) without policy checks
    pub fn new(raw: String) -> Self {
        Self(ClearTextPassword::new(raw))
    }

    /// Wrap a password being set; every policy violation becomes a field error
    pub fn validated(raw: String, policy: &PasswordPolicy) -> AuthResult<Self> {
        ClearTextPassword::validated(raw, policy)
            .map(Self)
            .map_err(AuthError::from)
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a raw password with Argon2id
    ///
    /// `pepper` is the optional application-wide secret.
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        Ok(Self(raw.inner().hash(pepper)?))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash (constant time)
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_collects_all_violations() {
        let err = RawPassword::validated("abc".to_string(), &PasswordPolicy::default())
            .unwrap_err();
        match err {
            AuthError::Validation(details) => {
                let codes: Vec<_> = details.iter().map(|d| d.code.as_ref()).collect();
                assert!(codes.contains(&"PasswordTooShort"));
                assert!(codes.contains(&"PasswordRequiresDigit"));
                assert!(codes.contains(&"PasswordRequiresUpper"));
                assert!(codes.contains(&"PasswordRequiresNonAlphanumeric"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("TestPassword123!".to_string());
        let hashed = UserPassword::from_raw(&raw, None).unwrap();

        assert!(hashed.verify(&raw, None));
        assert!(!hashed.verify(&RawPassword::new("WrongPassword123!".to_string()), None));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let raw = RawPassword::new("TestPassword123!".to_string());
        let hashed = UserPassword::from_raw(&raw, Some(b"pepper")).unwrap();

        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, Some(b"pepper")));
    }

    #[test]
    fn test_corrupt_hash_is_internal_error() {
        assert!(matches!(
            UserPassword::from_phc_string("garbage"),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("SecretPassword123!".to_string());
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));
    }
}
