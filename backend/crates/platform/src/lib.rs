//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations used by the domain crates:
//! - Cryptographic helpers (random bytes, SHA-256, HMAC-SHA256, base64url)
//! - Password policy checks and Argon2id hashing
//! - Cookie building and extraction

pub mod cookie;
pub mod crypto;
pub mod password;
