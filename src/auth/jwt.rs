//! JWT token generation and validation
//!
//! Stateless: a token binds an account id to an expiry and nothing is stored
//! server-side.

use crate::{config::AppConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token lifetime: 7 days
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    /// Create a service signing with `secret`
    ///
    /// An empty secret is a configuration error, never a usable key.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AppError> {
        if secret.trim().is_empty() {
            return Err(AppError::Config("JWT secret is not set".to_string()));
        }

        if secret.len() < 32 {
            tracing::warn!(
                length = secret.len(),
                "JWT secret is shorter than 32 characters; use a longer secret in production"
            );
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in verify_at so expired and forged tokens stay distinguishable
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            Duration::seconds(TOKEN_TTL_SECS),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `account_id`, valid from now
    pub fn issue(&self, account_id: Uuid) -> Result<String, AppError> {
        self.issue_at(account_id, Utc::now())
    }

    /// Issue a token as if minted at `issued_at`
    pub fn issue_at(&self, account_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let expiration = issued_at + self.ttl;

        let claims = Claims {
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Verify a token and return the account id it was issued for
    pub fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the clock value `now`
    ///
    /// Valid while `now <= exp`; `ExpiredToken` strictly after.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        let claims = self.decode_claims(token)?;

        if now.timestamp() > claims.exp {
            tracing::debug!(exp = claims.exp, "Token expired");
            return Err(AppError::ExpiredToken);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not an account id");
            AppError::InvalidToken
        })
    }

    /// Check signature and structure only
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::InvalidToken
            })?
            .claims)
    }
}
