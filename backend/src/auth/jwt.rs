use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use sha2::{Digest, Sha256};
use shared::TokenClaims;

use crate::domain::models::User;

/// Signs and checks access tokens with the configured HMAC secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, access_token_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime: Duration::minutes(access_token_minutes),
        }
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            worker: user.worker,
            exp: (now + self.access_lifetime).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding).context("Failed to encode JWT token")
    }

    pub fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        let token_data = decode::<TokenClaims>(token, &self.decoding, &Validation::default())
            .context("Failed to decode JWT token")?;
        Ok(token_data.claims)
    }
}

/// Opaque refresh token: 32 random bytes, hex encoded
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Refresh tokens are only ever stored as this digest
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
