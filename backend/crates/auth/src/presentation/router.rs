//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::email::EmailSender;
use crate::application::external_login::ExternalIdentityProvider;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::AuthStore;
use crate::infra::google::GoogleProvider;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_bearer;

/// Create the Auth router with PostgreSQL repository and Google sign-in
pub fn auth_router(
    repo: PgAuthRepository,
    google: Option<GoogleProvider>,
    email_sender: Arc<dyn EmailSender>,
    config: AuthConfig,
) -> Router {
    auth_router_generic(repo, google, email_sender, config)
}

/// Create a generic Auth router for any repository and provider implementation
pub fn auth_router_generic<R, P>(
    repo: R,
    provider: Option<P>,
    email_sender: Arc<dyn EmailSender>,
    config: AuthConfig,
) -> Router
where
    R: AuthStore,
    P: ExternalIdentityProvider + Clone + Sync + 'static,
{
    let issuer = Arc::new(TokenIssuer::new(config.jwt.clone()));

    let state = AuthAppState {
        repo: Arc::new(repo),
        provider: provider.map(Arc::new),
        email_sender,
        issuer: issuer.clone(),
        config: Arc::new(config),
    };

    let protected: Router<AuthAppState<R, P>> = Router::new()
        .route("/auth/change-password", post(handlers::change_password::<R, P>))
        .route("/profile/me", get(handlers::get_profile::<R, P>))
        .route("/profile/update", put(handlers::update_profile::<R, P>))
        .route_layer(middleware::from_fn_with_state(issuer, require_bearer));

    Router::new()
        .route("/auth/register", post(handlers::register::<R, P>))
        .route("/auth/confirm-email", get(handlers::confirm_email::<R, P>))
        .route("/auth/login", post(handlers::login::<R, P>))
        .route("/auth/logout", post(handlers::logout::<R, P>))
        .route("/auth/refresh-token", post(handlers::refresh_token::<R, P>))
        .route(
            "/auth/login/{provider}",
            post(handlers::external_login_challenge::<R, P>),
        )
        .route(
            "/auth/signing/{provider}",
            get(handlers::external_login_callback::<R, P>),
        )
        .route("/health", get(handlers::health))
        .merge(protected)
        .with_state(state)
}
