//! Auth Middleware
//!
//! Bearer-token authentication for protected routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::application::token_issuer::TokenIssuer;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthError;

/// Caller identity stored in request extensions by [`require_bearer`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid access token
///
/// Rejects with 401; an expired token additionally gets `Token-Expired: true`.
pub async fn require_bearer(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&req).ok_or(AuthError::Unauthenticated)?;

    let claims = issuer.validate_access_token(token)?;
    let user = AuthenticatedUser {
        user_id: claims.user_id()?,
        email: claims.email,
    };

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
