//! Password Policy, Hashing and Verification
//!
//! - Configurable complexity policy (length, character classes) that reports
//!   every violation at once, so a registration form can show them together
//! - Argon2id hashing (memory-hard, recommended by OWASP) with optional pepper
//! - Zeroization of clear-text passwords on drop
//!
//! Policy checks operate on the NFKC-normalized password and count Unicode
//! code points, not bytes.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Hard upper bound regardless of policy; keeps Argon2 input bounded
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// One password policy violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Passwords must be at least {min} characters.")]
    TooShort { min: usize },

    #[error("Passwords must be at most {max} characters.")]
    TooLong { max: usize },

    #[error("Passwords must have at least one lowercase ('a'-'z').")]
    RequiresLower,

    #[error("Passwords must have at least one uppercase ('A'-'Z').")]
    RequiresUpper,

    #[error("Passwords must have at least one digit ('0'-'9').")]
    RequiresDigit,

    #[error("Passwords must have at least one non alphanumeric character.")]
    RequiresNonAlphanumeric,

    #[error("Passwords cannot contain control characters.")]
    InvalidCharacter,
}

impl PasswordPolicyError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            PasswordPolicyError::TooShort { .. } => "PasswordTooShort",
            PasswordPolicyError::TooLong { .. } => "PasswordTooLong",
            PasswordPolicyError::RequiresLower => "PasswordRequiresLower",
            PasswordPolicyError::RequiresUpper => "PasswordRequiresUpper",
            PasswordPolicyError::RequiresDigit => "PasswordRequiresDigit",
            PasswordPolicyError::RequiresNonAlphanumeric => "PasswordRequiresNonAlphanumeric",
            PasswordPolicyError::InvalidCharacter => "PasswordInvalidCharacter",
        }
    }
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Policy
// ============================================================================

/// Password complexity requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub required_length: usize,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digit: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 6,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            require_non_alphanumeric: true,
        }
    }
}

impl PasswordPolicy {
    /// Check a password against the policy, returning every violation
    pub fn check(&self, raw: &str) -> Vec<PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();
        let mut violations = Vec::new();

        let char_count = normalized.chars().count();
        if char_count < self.required_length {
            violations.push(PasswordPolicyError::TooShort {
                min: self.required_length,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            violations.push(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
            });
        }

        if normalized.chars().any(|c| c.is_control()) {
            violations.push(PasswordPolicyError::InvalidCharacter);
        }

        if self.require_non_alphanumeric && normalized.chars().all(|c| c.is_ascii_alphanumeric())
        {
            violations.push(PasswordPolicyError::RequiresNonAlphanumeric);
        }
        if self.require_digit && !normalized.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordPolicyError::RequiresDigit);
        }
        if self.require_lowercase && !normalized.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push(PasswordPolicyError::RequiresLower);
        }
        if self.require_uppercase && !normalized.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push(PasswordPolicyError::RequiresUpper);
        }

        violations
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Not `Clone`, and `Debug` output is redacted.
///
/// ```rust
/// use platform::password::{ClearTextPassword, PasswordPolicy};
///
/// let password = ClearTextPassword::validated("Abc123!!".to_string(), &PasswordPolicy::default())
///     .expect("meets default policy");
/// let hashed = password.hash(None).unwrap();
/// assert!(hashed.verify(&password, None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Wrap a password without policy checks
    ///
    /// Used when verifying a login attempt: the policy applies when a
    /// password is set, not when it is presented.
    pub fn new(mut raw: String) -> Self {
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    /// Wrap a password that must satisfy `policy`
    pub fn validated(
        raw: String,
        policy: &PasswordPolicy,
    ) -> Result<Self, Vec<PasswordPolicyError>> {
        let violations = policy.check(&raw);
        if !violations.is_empty() {
            let mut raw = raw;
            raw.zeroize();
            return Err(violations);
        }
        Ok(Self::new(raw))
    }

    fn peppered_bytes(&self, pepper: Option<&[u8]>) -> Vec<u8> {
        let mut bytes = self.0.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }

    /// Hash the password using Argon2id
    ///
    /// `pepper` is an optional application-wide secret appended before hashing.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let mut password_bytes = self.peppered_bytes(pepper);

        // 128-bit random salt
        let salt = SaltString::generate(&mut OsRng);

        // OWASP parameters: m=19456 (19 MiB), t=2, p=1
        let result = Argon2::default()
            .hash_password(&password_bytes, &salt)
            .map(|hash| HashedPassword {
                hash: hash.to_string(),
            })
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()));

        password_bytes.zeroize();
        result
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash
    ///
    /// `pepper` must match the one used during hashing.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        let mut password_bytes = password.peppered_bytes(pepper);

        // Argon2 compares in constant time internally
        let ok = Argon2::default()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok();

        password_bytes.zeroize();
        ok
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PasswordPolicy {
        PasswordPolicy::default()
    }

    #[test]
    fn test_valid_password() {
        assert!(policy().check("Abc123!!").is_empty());
        assert!(policy().check("MySecure#Pass2024!").is_empty());
    }

    #[test]
    fn test_too_short() {
        let violations = policy().check("Ab1!");
        assert_eq!(violations, vec![PasswordPolicyError::TooShort { min: 6 }]);
    }

    #[test]
    fn test_too_long() {
        let long = format!("Aa1!{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert!(policy()
            .check(&long)
            .contains(&PasswordPolicyError::TooLong { max: MAX_PASSWORD_LENGTH }));
    }

    #[test]
    fn test_reports_every_violation() {
        let violations = policy().check("abc");
        assert!(violations.contains(&PasswordPolicyError::TooShort { min: 6 }));
        assert!(violations.contains(&PasswordPolicyError::RequiresNonAlphanumeric));
        assert!(violations.contains(&PasswordPolicyError::RequiresDigit));
        assert!(violations.contains(&PasswordPolicyError::RequiresUpper));
        assert!(!violations.contains(&PasswordPolicyError::RequiresLower));
    }

    #[test]
    fn test_relaxed_policy() {
        let relaxed = PasswordPolicy {
            required_length: 4,
            require_lowercase: false,
            require_uppercase: false,
            require_digit: false,
            require_non_alphanumeric: false,
        };
        assert!(relaxed.check("abcd").is_empty());
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(policy()
            .check("Abc123!\u{0007}")
            .contains(&PasswordPolicyError::InvalidCharacter));
    }

    #[test]
    fn test_codes() {
        assert_eq!(PasswordPolicyError::TooShort { min: 6 }.code(), "PasswordTooShort");
        assert_eq!(
            PasswordPolicyError::RequiresNonAlphanumeric.code(),
            "PasswordRequiresNonAlphanumeric"
        );
        assert_eq!(
            PasswordPolicyError::TooShort { min: 6 }.to_string(),
            "Passwords must be at least 6 characters."
        );
    }

    #[test]
    fn test_validated_rejects_weak_password() {
        let result = ClearTextPassword::validated("weak".to_string(), &policy());
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::new("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        assert!(hashed.verify(&password, None));

        let wrong_password = ClearTextPassword::new("WrongPassword123!".to_string());
        assert!(!hashed.verify(&wrong_password, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::new("TestPassword123!".to_string());
        let pepper = b"my_secret_pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let password = ClearTextPassword::new("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));
    }

    #[test]
    fn test_invalid_phc_string() {
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new("secret".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
