//! Access token verification.
//!
//! Tokens are HS256 JWTs issued by the club's account service. The server
//! only verifies them; [`TokenVerifier::issue`] exists for tests and local
//! tooling that share the secret.

use chrono::{Duration, Utc};
use club_pairing::tournament::UserId;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims for access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Verifies (and for local use, issues) access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Decode and validate a token, including its expiry
    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Sign a token for `user_id` valid for `ttl`
    pub fn issue(&self, user_id: UserId, username: &str, ttl: Duration) -> jsonwebtoken::errors::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
    }
}
