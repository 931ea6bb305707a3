use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{Claims, Role};
use crate::{config::AuthConfig, error::AppError};

const SECS_PER_DAY: usize = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid or expired token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs and verifies HS256 tokens carrying `{id, email, role}`.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    ttl_secs: usize,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_days: u64) -> Self {
        Self {
            keys: JwtKeys::from_secret(secret),
            ttl_secs: (ttl_days as usize).saturating_mul(SECS_PER_DAY),
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl_days)
    }

    pub fn ttl_secs(&self) -> usize {
        self.ttl_secs
    }

    pub fn sign(&self, id: i32, email: &str, role: Role) -> Result<String, TokenError> {
        let claims = make_claims(id, email, role, self.ttl_secs);
        encode_token(&self.keys, &claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.dec, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

pub fn now_unix() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

pub fn encode_token(keys: &JwtKeys, claims: &Claims) -> Result<String, TokenError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc).map_err(TokenError::Encode)
}

pub fn make_claims(id: i32, email: &str, role: Role, ttl_secs: usize) -> Claims {
    let iat = now_unix();
    Claims {
        id,
        email: email.to_string(),
        role,
        iat,
        exp: iat.saturating_add(ttl_secs),
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => AppError::unauthorized("Invalid or expired token"),
            TokenError::Encode(_) => AppError::internal("Token encoding failed"),
        }
    }
}
