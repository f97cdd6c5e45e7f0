//! Token pair issuance shared by Login, external sign-in and rotation.

use crate::application::token_issuer::{IssuedToken, TokenIssuer};
use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::RefreshTokenRepository;
use crate::error::{AuthError, AuthResult};

/// Result of a successful sign-in or rotation
pub struct SessionTokens {
    pub user: User,
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

/// Issue a refresh token, record it, then issue an access token
pub async fn issue_session_tokens<T>(
    token_repo: &T,
    issuer: &TokenIssuer,
    user: User,
) -> AuthResult<SessionTokens>
where
    T: RefreshTokenRepository,
{
    let refresh_token = issuer.issue_refresh_token(&user)?;

    let record = RefreshToken::new(
        user.user_id,
        refresh_token.token.clone(),
        refresh_token.issued_at,
        refresh_token.expires_at,
    );
    token_repo.save_refresh_token(&record).await.map_err(|e| {
        tracing::error!(user_id = %user.user_id, error = %e, "Failed to save refresh token");
        AuthError::RefreshTokenPersistFail
    })?;

    let access_token = issuer.issue_access_token(&user)?;

    Ok(SessionTokens {
        user,
        access_token,
        refresh_token,
    })
}
