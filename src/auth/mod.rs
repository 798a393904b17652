use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Token payload. Tokens are minted by the identity provider; this service
/// only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: impl Into<String>, is_staff: bool) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            username: username.into(),
            is_staff,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Authenticated caller, injected into request extensions by the JWT
/// middleware.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub is_staff: bool,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            is_staff: claims.is_staff,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Generation(jsonwebtoken::errors::Error),

    #[error("Invalid JWT token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

fn secret() -> Result<&'static str, TokenError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, TokenError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(TokenError::Generation)
}

pub fn decode_jwt(token: &str) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(TokenError::Invalid)
}
