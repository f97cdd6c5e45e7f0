//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Extension;
use std::sync::Arc;

use platform::cookie::{delete_cookie_header, extract_cookie, set_cookie_header};
use platform::crypto::{from_base64url, hmac_sha256, hmac_sha256_verify, random_bytes, to_base64url};

use crate::application::config::AuthConfig;
use crate::application::email::EmailSender;
use crate::application::token_issuer::TokenIssuer;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, ConfirmEmailUseCase, ExternalIdentityProvider,
    ExternalLoginUseCase, LoginInput, LoginUseCase, LogoutUseCase, ProfileUpdate,
    ProfileUseCase, RefreshTokenUseCase, RegisterInput, RegisterUseCase, SessionTokens,
};
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, ConfirmEmailQuery, CredentialsRequest, ExternalCallbackQuery,
    HealthResponse, ProfileResponse, TokenResponse, UpdateProfileRequest,
};
use crate::presentation::middleware::AuthenticatedUser;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, P>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    pub repo: Arc<R>,
    /// `None` when no external provider is configured
    pub provider: Option<Arc<P>>,
    pub email_sender: Arc<dyn EmailSender>,
    pub issuer: Arc<TokenIssuer>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Register / Confirm
// ============================================================================

/// POST /auth/register
pub async fn register<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Json(req): Json<CredentialsRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.email_sender.clone(),
        state.config.clone(),
    );

    use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(StatusCode::OK)
}

/// GET /auth/confirm-email?email=..&token=..
pub async fn confirm_email<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Query(query): Query<ConfirmEmailQuery>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let use_case = ConfirmEmailUseCase::new(state.repo.clone(), state.repo.clone());

    use_case.execute(&query.email, &query.token).await?;

    Ok(StatusCode::OK)
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /auth/login
pub async fn login<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Json(req): Json<CredentialsRequest>,
) -> AuthResult<Response>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let tokens = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(token_response(&state.config, &tokens))
}

/// POST /auth/logout
///
/// Always clears the cookies and redirects, even if revocation fails.
pub async fn logout<R, P>(
    State(state): State<AuthAppState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    if let Some(token) = extract_cookie(&headers, &state.config.cookies.refresh_token.name) {
        let use_case = LogoutUseCase::new(state.repo.clone(), state.issuer.clone());
        if let Err(e) = use_case.execute(&token).await {
            tracing::warn!(error = %e, "Failed to revoke refresh token on logout");
        }
    }

    redirect(
        state.config.web_base_url(),
        vec![
            delete_cookie_header(&state.config.cookies.refresh_token),
            delete_cookie_header(&state.config.cookies.external_state),
        ],
    )
}

// ============================================================================
// Token Rotation
// ============================================================================

/// POST /auth/refresh-token
pub async fn refresh_token<R, P>(
    State(state): State<AuthAppState<R, P>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let presented = extract_cookie(&headers, &state.config.cookies.refresh_token.name);

    let use_case = RefreshTokenUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
        state.config.clone(),
    );

    let tokens = use_case.execute(presented.as_deref()).await?;

    Ok(token_response(&state.config, &tokens))
}

// ============================================================================
// External Login
// ============================================================================

/// POST /auth/login/{provider}
///
/// Starts the authorization-code flow.
pub async fn external_login_challenge<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Path(provider_name): Path<String>,
) -> AuthResult<Response>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let provider = resolve_provider(&state, &provider_name)?;

    let login_state = to_base64url(&random_bytes(32));
    let cookie_value = sign_state(&state.config.state_secret, provider.name(), &login_state);

    tracing::debug!(provider = %provider.name(), "External login challenge");

    Ok(redirect(
        &provider.authorization_url(&login_state),
        vec![set_cookie_header(
            &state.config.cookies.external_state,
            &cookie_value,
        )],
    ))
}

/// GET /auth/signing/{provider}?code=..&state=..
///
/// Provider callback. Failures redirect to the web app login page with an
/// `error` query parameter instead of returning an error body.
pub async fn external_login_callback<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Path(provider_name): Path<String>,
    Query(query): Query<ExternalCallbackQuery>,
    headers: HeaderMap,
) -> Response
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let clear_state = delete_cookie_header(&state.config.cookies.external_state);

    match complete_external_login(&state, &provider_name, query, &headers).await {
        Ok(tokens) => redirect(
            &format!("{}/", state.config.web_base_url()),
            vec![
                set_cookie_header(
                    &state.config.cookies.refresh_token,
                    &tokens.refresh_token.token,
                ),
                clear_state,
            ],
        ),
        Err(e) => {
            let message = external_error_message(&e);
            tracing::warn!(provider = %provider_name, error = %e, "External login callback failed");
            redirect(&login_error_url(state.config.web_base_url(), &message), vec![
                clear_state,
            ])
        }
    }
}

async fn complete_external_login<R, P>(
    state: &AuthAppState<R, P>,
    provider_name: &str,
    query: ExternalCallbackQuery,
    headers: &HeaderMap,
) -> AuthResult<SessionTokens>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let provider = resolve_provider(state, provider_name)?;

    if let Some(error) = query.error {
        return Err(AuthError::ExternalLoginFailed(format!(
            "Error from external provider: {error}"
        )));
    }

    let cookie = extract_cookie(headers, &state.config.cookies.external_state.name);
    let state_ok = match (cookie.as_deref(), query.state.as_deref()) {
        (Some(cookie), Some(returned)) => {
            verify_state(&state.config.state_secret, provider.name(), cookie, returned)
        }
        _ => false,
    };
    if !state_ok {
        return Err(AuthError::ExternalLoginFailed(
            "Invalid external login state".to_string(),
        ));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::ExternalLoginFailed("Missing authorization code".to_string()))?;

    let info = provider.exchange_code(&code).await?;

    let use_case = ExternalLoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.issuer.clone(),
    );

    use_case.execute(provider.name(), info).await
}

// ============================================================================
// Password / Profile (bearer-protected)
// ============================================================================

/// POST /auth/change-password
pub async fn change_password<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());

    use_case
        .execute(
            &caller.user_id,
            ChangePasswordInput {
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

/// GET /profile/me
pub async fn get_profile<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let profile = ProfileUseCase::new(state.repo.clone())
        .get(&caller.user_id)
        .await?;

    Ok(Json(profile.into()))
}

/// PUT /profile/update
pub async fn update_profile<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let update = ProfileUpdate {
        user_name: req.user_name,
        display_name: req.display_name,
        bio: req.bio,
        avatar: req.avatar,
    };

    let profile = ProfileUseCase::new(state.repo.clone())
        .update(&caller.user_id, update)
        .await?;

    Ok(Json(profile.into()))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ============================================================================
// Helper Functions
// ============================================================================

fn token_response(config: &AuthConfig, tokens: &SessionTokens) -> Response {
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            set_cookie_header(&config.cookies.refresh_token, &tokens.refresh_token.token),
        )],
        Json(TokenResponse::from(tokens)),
    )
        .into_response()
}

fn redirect(location: &str, cookies: Vec<HeaderValue>) -> Response {
    let location =
        HeaderValue::from_str(location).unwrap_or_else(|_| HeaderValue::from_static("/"));
    (
        StatusCode::FOUND,
        [(header::LOCATION, location)],
        AppendHeaders(cookies.into_iter().map(|c| (header::SET_COOKIE, c))),
    )
        .into_response()
}

fn resolve_provider<R, P>(state: &AuthAppState<R, P>, requested: &str) -> AuthResult<Arc<P>>
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    state
        .provider
        .as_ref()
        .filter(|p| p.name().eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| AuthError::UnsupportedProvider(requested.to_string()))
}

fn state_mac_input(provider: &str, login_state: &str) -> String {
    format!("{}:{}", provider.to_ascii_lowercase(), login_state)
}

/// `{state}.{base64url(hmac(provider:state))}`
fn sign_state(secret: &[u8], provider: &str, login_state: &str) -> String {
    let tag = hmac_sha256(secret, state_mac_input(provider, login_state).as_bytes());
    format!("{}.{}", login_state, to_base64url(&tag))
}

/// Cookie must be ours, for this provider, and carry the state the provider echoed
fn verify_state(secret: &[u8], provider: &str, cookie: &str, returned: &str) -> bool {
    let Some((login_state, tag)) = cookie.split_once('.') else {
        return false;
    };
    let Ok(tag) = from_base64url(tag) else {
        return false;
    };
    login_state == returned
        && hmac_sha256_verify(
            secret,
            state_mac_input(provider, login_state).as_bytes(),
            &tag,
        )
}

fn external_error_message(e: &AuthError) -> String {
    match e {
        AuthError::ExternalLoginFailed(message) => message.clone(),
        e if e.status_code().is_server_error() => "External login failed".to_string(),
        e => e.to_string(),
    }
}

fn login_error_url(web_base_url: &str, message: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", message)
        .finish();
    format!("{web_base_url}/login?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let secret = [7u8; 32];
        let cookie = sign_state(&secret, "Google", "abc");
        assert!(verify_state(&secret, "Google", &cookie, "abc"));
        assert!(verify_state(&secret, "google", &cookie, "abc"));
    }

    #[test]
    fn test_state_mismatch_rejected() {
        let secret = [7u8; 32];
        let cookie = sign_state(&secret, "Google", "abc");
        assert!(!verify_state(&secret, "Google", &cookie, "abd"));
        assert!(!verify_state(&[8u8; 32], "Google", &cookie, "abc"));
        assert!(!verify_state(&secret, "GitHub", &cookie, "abc"));
        assert!(!verify_state(&secret, "Google", "abc", "abc"));
        assert!(!verify_state(&secret, "Google", "abc.***", "abc"));
    }

    #[test]
    fn test_login_error_url() {
        assert_eq!(
            login_error_url("https://app", "Username 'a' is already taken."),
            "https://app/login?error=Username+%27a%27+is+already+taken."
        );
    }

    #[test]
    fn test_server_errors_are_not_echoed() {
        let e = AuthError::Internal("db password is hunter2".to_string());
        assert_eq!(external_error_message(&e), "External login failed");
        let e = AuthError::ExternalLoginFailed("Google rejected the sign-in".to_string());
        assert_eq!(external_error_message(&e), "Google rejected the sign-in");
    }
}
