use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::{
    error::ApiError,
    schema::{Id, User},
};
use crate::MSG_INVALID_TOKEN;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub email: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, email: String, ttl: Duration) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + ttl).timestamp();

        Self {
            user_id: id,
            email,
            iat,
            exp,
        }
    }

    pub fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// The authenticated requester every owner-scoped operation runs as.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub email: String,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            email: value.email,
        }
    }
}

/// Signs and verifies session tokens with one HMAC-SHA256 key.
#[derive(Clone)]
pub struct SessionKey {
    key: Hmac<Sha256>,
    ttl: Duration,
}

impl SessionKey {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Result<Self, ApiError> {
        let key = Hmac::new_from_slice(secret)
            .map_err(|e| ApiError::Internal(format!("Invalid session secret: {e}")))?;

        Ok(Self {
            key,
            ttl: Duration::hours(ttl_hours),
        })
    }

    pub fn generate_jwt_session(&self, user: &User) -> Result<String, ApiError> {
        let claims = JwtSessionData::new(user.id, user.email.to_owned(), self.ttl);
        self.sign(&claims)
    }

    fn sign(&self, claims: &JwtSessionData) -> Result<String, ApiError> {
        claims
            .sign_with_key(&self.key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign session: {e}")))
    }

    pub fn verify_jwt_session(&self, token: &str) -> Result<JwtSessionData, ApiError> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| ApiError::Unauthenticated(MSG_INVALID_TOKEN))?;

        let now = Local::now().timestamp();
        if (session.exp - now).is_negative() {
            return Err(ApiError::Unauthenticated(MSG_INVALID_TOKEN));
        }

        Ok(session)
    }
}
