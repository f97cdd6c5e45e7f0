//! Auth (Identity) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations and the Google provider
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - Registration with email confirmation
//! - Email + password login returning a JWT access token
//! - Rotating refresh tokens carried in an HttpOnly cookie
//! - Google sign-in (authorization-code flow)
//! - Password change and profile editing for authenticated users
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional application-wide pepper
//! - Access and refresh tokens signed with separate HS256 secrets
//! - Every refresh token is recorded; rotation revokes the presented one
//!   with a compare-and-swap so a token is redeemed at most once
//! - Login failures do not reveal whether the email exists

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::email::{EmailSender, LogEmailSender};
pub use error::{AuthError, AuthResult};
pub use infra::{GoogleProvider, InMemoryAuthRepository, PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
