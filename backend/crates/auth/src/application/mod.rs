//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod config;
pub mod confirm_email;
pub mod email;
pub mod external_login;
pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh_token;
pub mod register;
pub mod session_tokens;
pub mod token_issuer;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AuthConfig;
pub use confirm_email::ConfirmEmailUseCase;
pub use email::{EmailMessage, EmailSender, EmailTemplate, LogEmailSender};
pub use external_login::{ExternalIdentityProvider, ExternalLoginInfo, ExternalLoginUseCase};
pub use login::{LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use profile::{Profile, ProfileUpdate, ProfileUseCase};
pub use refresh_token::RefreshTokenUseCase;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use session_tokens::SessionTokens;
pub use token_issuer::{AccessClaims, IssuedToken, RefreshClaims, TokenIssuer};
