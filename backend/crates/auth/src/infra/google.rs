//! Google OAuth 2.0 Provider
//!
//! Authorization-code flow: build the consent URL, exchange the callback
//! code for an access token, then read the OpenID userinfo.

use serde::Deserialize;

use crate::application::config::GoogleSettings;
use crate::application::external_login::{ExternalIdentityProvider, ExternalLoginInfo};
use crate::error::{AuthError, AuthResult};

pub const GOOGLE_PROVIDER: &str = "Google";

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Clone)]
pub struct GoogleProvider {
    settings: GoogleSettings,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

impl GoogleProvider {
    pub fn new(settings: GoogleSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_access_token(&self, code: &str) -> AuthResult<String> {
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google token request failed");
                AuthError::ExternalLoginFailed("Could not reach Google".to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Google rejected authorization code");
            return Err(AuthError::ExternalLoginFailed(
                "Google rejected the sign-in".to_string(),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed Google token response");
            AuthError::ExternalLoginFailed("Unexpected response from Google".to_string())
        })?;

        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<UserInfo> {
        let response = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google userinfo request failed");
                AuthError::ExternalLoginFailed("Could not reach Google".to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Google userinfo request rejected");
            return Err(AuthError::ExternalLoginFailed(
                "Google rejected the sign-in".to_string(),
            ));
        }

        response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed Google userinfo response");
            AuthError::ExternalLoginFailed("Unexpected response from Google".to_string())
        })
    }
}

impl ExternalIdentityProvider for GoogleProvider {
    fn name(&self) -> &str {
        GOOGLE_PROVIDER
    }

    fn authorization_url(&self, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .finish();
        format!("{AUTHORIZATION_ENDPOINT}?{query}")
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<ExternalLoginInfo> {
        let access_token = self.fetch_access_token(code).await?;
        let info = self.fetch_user_info(&access_token).await?;

        let email = info.email.ok_or_else(|| {
            AuthError::ExternalLoginFailed("Google account has no email".to_string())
        })?;

        Ok(ExternalLoginInfo {
            provider_key: info.sub,
            email,
            email_verified: info.email_verified,
            display_name: info.name,
        })
    }
}
