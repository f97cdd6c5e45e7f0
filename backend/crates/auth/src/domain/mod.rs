//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    email_confirmation::EmailConfirmation, external_login::ExternalLogin,
    refresh_token::RefreshToken, user::User,
};
pub use repository::{
    AuthStore, EmailConfirmationRepository, ExternalLoginRepository, RefreshTokenRepository,
    UserRepository,
};
