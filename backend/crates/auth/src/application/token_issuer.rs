//! Token Issuer
//!
//! HS256 JWTs. Access tokens are short-lived and stateless; refresh tokens
//! are signed with a separate secret and recorded in the ledger by the
//! caller.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::JwtSettings;
use crate::domain::entity::user::User;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessClaims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub.parse().map_err(|_| AuthError::Unauthenticated)
    }
}

/// Refresh token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// An encoded token with its lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenIssuer {
    settings: JwtSettings,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(settings: JwtSettings) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(settings.token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(settings.token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(settings.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(settings.refresh_token_secret.as_bytes()),
            settings,
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Signed access token, `exp = now + token_duration`
    pub fn issue_access_token(&self, user: &User) -> AuthResult<IssuedToken> {
        let (issued_at, expires_at) =
            Self::lifetime(Duration::minutes(self.settings.token_duration_minutes))?;

        let claims = AccessClaims {
            sub: user.user_id.to_string(),
            email: user.email.as_str().to_string(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to encode access token");
                AuthError::TokenGenerationFail
            })?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Signed refresh token, `exp = now + refresh_token_duration`
    pub fn issue_refresh_token(&self, user: &User) -> AuthResult<IssuedToken> {
        let (issued_at, expires_at) =
            Self::lifetime(Duration::days(self.settings.refresh_token_duration_days))?;

        let claims = RefreshClaims {
            email: user.email.as_str().to_string(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to encode refresh token");
                AuthError::TokenGenerationFail
            })?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature, issuer, audience and expiry
    ///
    /// Revocation is not checked here. Never fails loudly: any problem
    /// yields `None`.
    pub fn validate_refresh_token(&self, token: &str) -> Option<RefreshClaims> {
        match decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Refresh token failed validation");
                None
            }
        }
    }

    /// Verify an access token; expiry is reported separately
    pub fn validate_access_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = self.validation();
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        decode::<AccessClaims>(token, &self.access_decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::AccessTokenExpired,
                _ => AuthError::Unauthenticated,
            })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = self.settings.leeway_secs;
        validation
    }

    /// Issued-at truncated to whole seconds so it matches the encoded `iat`
    fn lifetime(duration: Duration) -> AuthResult<(DateTime<Utc>, DateTime<Utc>)> {
        let issued_at = Utc
            .timestamp_opt(Utc::now().timestamp(), 0)
            .single()
            .ok_or(AuthError::TokenGenerationFail)?;
        let expires_at = issued_at
            .checked_add_signed(duration)
            .ok_or(AuthError::TokenGenerationFail)?;
        Ok((issued_at, expires_at))
    }
}
