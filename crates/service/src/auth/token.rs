use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;

/// JWT claims carried by dashboard sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: Uuid,
    pub bid: Uuid,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    pub fn is_platform_admin(&self) -> bool {
        self.role == models::user::ROLE_PLATFORM_ADMIN
    }

    pub fn is_owner(&self) -> bool {
        self.role == models::user::ROLE_OWNER || self.is_platform_admin()
    }
}

pub fn issue(secret: &str, user: &AuthUser, ttl_hours: i64) -> Result<(String, i64), AuthError> {
    let exp = (Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp();
    let claims = Claims { sub: user.email.clone(), uid: user.id, bid: user.business_id, role: user.role.clone(), exp };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))?;
    Ok((token, exp))
}

pub fn verify(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}
