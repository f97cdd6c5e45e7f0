//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, detail::ErrorDetail, kind::ErrorKind};
use thiserror::Error;

use crate::domain::value_object::user_name::UserName;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// `Token-Expired` response header, set when a bearer token was rejected only for being expired
pub const TOKEN_EXPIRED_HEADER: &str = "token-expired";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email already registered
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    /// Unknown email, password-less account or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Failed to generate token")]
    TokenGenerationFail,

    #[error("Failed to save refresh token")]
    RefreshTokenPersistFail,

    /// Federated login could not create or link the local user
    #[error("External login failed: {0}")]
    ExternalLoginFailed(String),

    /// Email confirmation token malformed, unknown, consumed or expired
    #[error("Invalid token")]
    TokenInvalid,

    #[error("Refresh token is missing")]
    RefreshTokenMissing,

    /// Bad signature, issuer, audience or expiry
    #[error("Refresh token is invalid")]
    RefreshTokenInvalid,

    /// Well-formed but revoked, expired in the ledger, unknown or lost a race
    #[error("Refresh token was rejected")]
    RefreshTokenRejected,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access token expired")]
    AccessTokenExpired,

    #[error("Unsupported login provider: {0}")]
    UnsupportedProvider(String),

    /// Field-level validation failures
    #[error("Validation failed")]
    Validation(Vec<ErrorDetail>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Single-field validation failure
    pub fn field(code: &'static str, description: &'static str) -> Self {
        AuthError::Validation(vec![ErrorDetail::new(code, description)])
    }

    /// User name already held by another account
    pub fn duplicate_user_name(user_name: &UserName) -> Self {
        AuthError::Validation(vec![ErrorDetail::new(
            "DuplicateUserName",
            format!("Username '{}' is already taken.", user_name),
        )])
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserAlreadyExists
            | AuthError::UserNotFound
            | AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::ExternalLoginFailed(_)
            | AuthError::UnsupportedProvider(_)
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::RefreshTokenRejected
            | AuthError::Unauthenticated
            | AuthError::AccessTokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::RefreshTokenMissing | AuthError::RefreshTokenInvalid => {
                StatusCode::FORBIDDEN
            }
            AuthError::TokenGenerationFail
            | AuthError::RefreshTokenPersistFail
            | AuthError::Database(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self.status_code() {
            StatusCode::BAD_REQUEST => ErrorKind::BadRequest,
            StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
            StatusCode::FORBIDDEN => ErrorKind::Forbidden,
            _ => ErrorKind::InternalServerError,
        }
    }

    /// Stable code carried in the `errors` list of the problem document
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UserAlreadyExists => "UserAlreadyExists",
            AuthError::UserNotFound => "UserNotFound",
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::TokenGenerationFail => "TokenGenerationFail",
            AuthError::RefreshTokenPersistFail => "RefreshTokenPersistFail",
            AuthError::ExternalLoginFailed(_) => "ExternalLoginFailed",
            AuthError::TokenInvalid => "InvalidToken",
            AuthError::RefreshTokenMissing => "RefreshTokenMissing",
            AuthError::RefreshTokenInvalid => "RefreshTokenInvalid",
            AuthError::RefreshTokenRejected => "RefreshTokenRejected",
            AuthError::Unauthenticated => "Unauthenticated",
            AuthError::AccessTokenExpired => "AccessTokenExpired",
            AuthError::UnsupportedProvider(_) => "UnsupportedProvider",
            AuthError::Validation(_) => "ValidationFailed",
            AuthError::Database(_) => "DatabaseError",
            AuthError::Internal(_) => "InternalError",
        }
    }

    /// Convert to AppError
    ///
    /// Database errors go through the kernel's sqlx mapping; internal
    /// details never reach the response body.
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::Database(e) => AppError::from(e),
            AuthError::Internal(_) => AppError::internal("Internal error"),
            AuthError::Validation(details) => {
                AppError::bad_request("One or more validation errors occurred")
                    .with_details(details)
            }
            other => {
                let action = other.action();
                let detail = ErrorDetail::new(other.code(), other.to_string());
                let err = AppError::new(other.kind(), other.to_string()).with_details(vec![detail]);
                match action {
                    Some(action) => err.with_action(action),
                    None => err,
                }
            }
        }
    }

    /// What the client should do next
    fn action(&self) -> Option<&'static str> {
        match self {
            AuthError::AccessTokenExpired => Some("Refresh the access token"),
            AuthError::RefreshTokenMissing
            | AuthError::RefreshTokenInvalid
            | AuthError::RefreshTokenRejected => Some("Sign in again"),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::TokenGenerationFail | AuthError::RefreshTokenPersistFail => {
                tracing::error!(error = %self, "Token issuance failed");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RefreshTokenRejected | AuthError::RefreshTokenInvalid => {
                tracing::warn!(error = %self, "Refresh token refused");
            }
            AuthError::ExternalLoginFailed(reason) => {
                tracing::warn!(reason = %reason, "External login failed");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let expired = matches!(self, AuthError::AccessTokenExpired);
        let mut response = self.into_app_error().into_response();
        if expired {
            response
                .headers_mut()
                .insert(TOKEN_EXPIRED_HEADER, HeaderValue::from_static("true"));
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<Vec<platform::password::PasswordPolicyError>> for AuthError {
    fn from(violations: Vec<platform::password::PasswordPolicyError>) -> Self {
        AuthError::Validation(
            violations
                .into_iter()
                .map(|v| ErrorDetail::new(v.code(), v.to_string()))
                .collect(),
        )
    }
}
