//! Signed bearer tokens (HS256).
//!
//! Three kinds share one claim set and one secret; `token_type` keeps them
//! from being used interchangeably.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_shared::account::TokenPair;
use agora_shared::ErrorCode;
use agora_store::User;

use crate::auth::password::password_stamp;
use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    /// Password stamp at issue time; reset tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.sub).map_err(|_| token_not_valid())
    }
}

pub fn token_not_valid() -> ApiError {
    ApiError::Unauthorized(
        ErrorCode::TokenNotValid,
        "Given token not valid for any token type".to_string(),
    )
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration, reset_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
            reset_ttl,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::seconds(config.access_token_ttl_secs),
            Duration::seconds(config.refresh_token_ttl_secs),
            Duration::seconds(config.password_reset_ttl_secs),
        )
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access: self.issue(user.id, &user.email, TokenKind::Access)?,
            refresh: self.issue(user.id, &user.email, TokenKind::Refresh)?,
        })
    }

    /// A reset token stops verifying against the account once its password
    /// changes.
    pub fn issue_reset(&self, user: &User) -> Result<String, ApiError> {
        let mut claims = self.claims(user.id, &user.email, TokenKind::Reset);
        claims.stamp = Some(password_stamp(&user.password_hash).to_string());
        self.encode(&claims)
    }

    pub fn issue(&self, user_id: Uuid, email: &str, kind: TokenKind) -> Result<String, ApiError> {
        self.encode(&self.claims(user_id, email, kind))
    }

    fn claims(&self, user_id: Uuid, email: &str, kind: TokenKind) -> Claims {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Reset => self.reset_ttl,
        };
        let now = Utc::now();
        Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type: kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            stamp: None,
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("token encoding failed: {e}")))
    }

    /// Decode a token, checking signature, expiry and kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected token");
                token_not_valid()
            })?;
        if claims.token_type != kind {
            return Err(token_not_valid());
        }
        Ok(claims)
    }
}
