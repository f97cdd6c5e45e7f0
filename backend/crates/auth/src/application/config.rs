//! Application Configuration
//!
//! Immutable settings injected at startup.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::{random_bytes, to_base64url};
use platform::password::PasswordPolicy;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const EXTERNAL_STATE_COOKIE: &str = "externalLoginState";

/// JWT signing parameters
#[derive(Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    /// HS256 secret for access tokens
    pub token_secret: String,
    /// Separate HS256 secret for refresh tokens
    pub refresh_token_secret: String,
    pub token_duration_minutes: i64,
    pub refresh_token_duration_days: i64,
    /// Clock skew tolerated when validating `exp`
    pub leeway_secs: u64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            issuer: "identity-api".to_string(),
            audience: "identity-web".to_string(),
            token_secret: String::new(),
            refresh_token_secret: String::new(),
            token_duration_minutes: 30,
            refresh_token_duration_days: 7,
            leeway_secs: 60,
        }
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_duration_minutes", &self.token_duration_minutes)
            .field("refresh_token_duration_days", &self.refresh_token_duration_days)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

/// Cookies set by the session boundary
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub refresh_token: CookieConfig,
    /// Short-lived, HMAC-signed OAuth `state`
    pub external_state: CookieConfig,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            refresh_token: CookieConfig {
                name: REFRESH_TOKEN_COOKIE.to_string(),
                secure: true,
                http_only: true,
                same_site: SameSite::None,
                path: "/".to_string(),
                max_age_secs: Some(7 * 24 * 3600),
            },
            external_state: CookieConfig {
                name: EXTERNAL_STATE_COOKIE.to_string(),
                secure: true,
                http_only: true,
                // Sent on the top-level redirect back from the provider
                same_site: SameSite::Lax,
                path: "/".to_string(),
                max_age_secs: Some(10 * 60),
            },
        }
    }
}

/// What rotation does with a well-signed refresh token that is not in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshPolicy {
    /// Issue new tokens anyway instead of rejecting with 401
    pub allow_unrecorded: bool,
}

/// Google OAuth 2.0 client
#[derive(Clone)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect URI registered with Google
    pub redirect_uri: String,
}

impl std::fmt::Debug for GoogleSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSettings")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtSettings,
    pub cookies: CookieSettings,
    pub password_policy: PasswordPolicy,
    pub refresh_policy: RefreshPolicy,
    /// Front-end origin used in emailed links and redirects (no trailing slash)
    pub web_base_url: String,
    pub google: Option<GoogleSettings>,
    pub email_confirmation_ttl: Duration,
    /// HMAC key for the external login state cookie
    pub state_secret: [u8; 32],
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtSettings::default(),
            cookies: CookieSettings::default(),
            password_policy: PasswordPolicy::default(),
            refresh_policy: RefreshPolicy::default(),
            web_base_url: "http://localhost:3000".to_string(),
            google: None,
            email_confirmation_ttl: Duration::from_secs(24 * 3600),
            state_secret: [0u8; 32],
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with random signing secrets (for development and tests)
    pub fn with_random_secrets() -> Self {
        let mut state_secret = [0u8; 32];
        state_secret.copy_from_slice(&random_bytes(32));
        Self {
            jwt: JwtSettings {
                token_secret: to_base64url(&random_bytes(32)),
                refresh_token_secret: to_base64url(&random_bytes(32)),
                ..JwtSettings::default()
            },
            state_secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookies)
    pub fn development() -> Self {
        let mut config = Self::with_random_secrets();
        config.cookies.refresh_token.secure = false;
        config.cookies.refresh_token.same_site = SameSite::Lax;
        config.cookies.external_state.secure = false;
        config
    }

    /// Web app base URL without trailing slash
    pub fn web_base_url(&self) -> &str {
        self.web_base_url.trim_end_matches('/')
    }

    pub fn email_confirmation_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.email_confirmation_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(24))
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt.token_duration_minutes, 30);
        assert_eq!(config.jwt.refresh_token_duration_days, 7);
        assert_eq!(config.jwt.leeway_secs, 60);
        assert!(!config.refresh_policy.allow_unrecorded);
        assert_eq!(config.cookies.refresh_token.name, "refreshToken");
        assert_eq!(config.cookies.refresh_token.same_site, SameSite::None);
        assert_eq!(config.cookies.refresh_token.max_age_secs, Some(604_800));
        assert_eq!(config.email_confirmation_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_random_secrets_differ() {
        let config = AuthConfig::with_random_secrets();
        assert!(!config.jwt.token_secret.is_empty());
        assert_ne!(config.jwt.token_secret, config.jwt.refresh_token_secret);
        assert_ne!(config.state_secret, [0u8; 32]);
    }

    #[test]
    fn test_development_cookies_are_not_secure() {
        let config = AuthConfig::development();
        assert!(!config.cookies.refresh_token.secure);
        assert!(!config.cookies.external_state.secure);
    }

    #[test]
    fn test_web_base_url_trims_slash() {
        let config = AuthConfig {
            web_base_url: "https://app.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.web_base_url(), "https://app.example.com");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AuthConfig::with_random_secrets();
        let debug = format!("{:?}", config.jwt);
        assert!(!debug.contains(&config.jwt.token_secret));
    }
}
