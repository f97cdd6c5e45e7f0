//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are rendered
//! by the auth crate as problem documents.

use anyhow::Context;
use auth::config::{GoogleSettings, JwtSettings};
use auth::{AuthConfig, GoogleProvider, LogEmailSender, PgAuthRepository, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired refresh tokens and confirmations
    // Errors here should not prevent server startup
    let auth_store_for_cleanup = PgAuthRepository::new(pool.clone());
    match auth_store_for_cleanup.cleanup_expired().await {
        Ok((refresh_tokens, confirmations)) => {
            tracing::info!(
                refresh_tokens_deleted = refresh_tokens,
                confirmations_deleted = confirmations,
                "Auth cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Auth cleanup failed, continuing anyway"
            );
        }
    }

    // Auth configuration
    let auth_config = load_auth_config()?;

    let google = auth_config.google.clone().map(GoogleProvider::new);
    if google.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set, external login disabled");
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .expose_headers([http::HeaderName::from_static("token-expired")])
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .merge(auth_router(
            PgAuthRepository::new(pool.clone()),
            google,
            Arc::new(LogEmailSender),
            auth_config,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .ok()
        .and_then(|addr| addr.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 31113)));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the auth configuration from the environment
///
/// Debug builds fall back to random secrets and insecure cookies.
fn load_auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        let mut config = AuthConfig::with_random_secrets();
        config.jwt = JwtSettings {
            token_secret: required_env("JWT_TOKEN_SECRET")?,
            refresh_token_secret: required_env("JWT_REFRESH_TOKEN_SECRET")?,
            ..config.jwt
        };
        config
    };

    if let Ok(secret) = env::var("JWT_TOKEN_SECRET") {
        config.jwt.token_secret = secret;
    }
    if let Ok(secret) = env::var("JWT_REFRESH_TOKEN_SECRET") {
        config.jwt.refresh_token_secret = secret;
    }
    if let Ok(issuer) = env::var("JWT_ISSUER") {
        config.jwt.issuer = issuer;
    }
    if let Ok(audience) = env::var("JWT_AUDIENCE") {
        config.jwt.audience = audience;
    }
    if let Ok(minutes) = env::var("JWT_TOKEN_DURATION_MINUTES") {
        config.jwt.token_duration_minutes = minutes.parse()?;
    }
    if let Ok(url) = env::var("WEB_APP_BASE_URL") {
        config.web_base_url = url;
    }

    // Pepper is base64 so arbitrary bytes survive the environment
    if let Ok(pepper_b64) = env::var("PASSWORD_PEPPER") {
        let pepper = Engine::decode(&general_purpose::STANDARD, pepper_b64.trim())?;
        config.password_pepper = Some(pepper);
    }

    if let (Ok(client_id), Ok(client_secret)) =
        (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET"))
    {
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:31113".to_string());
        config.google = Some(GoogleSettings {
            client_id,
            client_secret,
            redirect_uri: format!(
                "{}/auth/signing/{}",
                api_base_url.trim_end_matches('/'),
                auth::infra::google::GOOGLE_PROVIDER
            ),
        });
    }

    tracing::info!(jwt = ?config.jwt, web_base_url = %config.web_base_url(), "Auth configuration loaded");

    Ok(config)
}

/// Read a variable that release builds cannot start without
fn required_env(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{name} must be set in production"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_env_is_an_error() {
        let err = required_env("API_TEST_SURELY_UNSET_SECRET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "API_TEST_SURELY_UNSET_SECRET must be set in production"
        );
    }
}
