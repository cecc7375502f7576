//! HS256 session tokens.

use crate::error::AppError;
use crate::models::User;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Human-readable issue time.
    pub time: String,
    pub user_id: i32,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, AppError> {
        let iat = now.timestamp();
        let claims = Claims {
            time: now.to_rfc2822(),
            user_id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat,
            exp: iat + self.ttl_secs,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Checks signature and expiry against `now`. Any failure is reported the same way.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is compared against the caller's clock below
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AppError::Unauthorized(INVALID_TOKEN_MSG.into()))?;
        if data.claims.exp < now.timestamp() {
            return Err(AppError::Unauthorized(INVALID_TOKEN_MSG.into()));
        }
        Ok(data.claims)
    }
}

pub const INVALID_TOKEN_MSG: &str = "Token expired or invalid!";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: 7,
            email: "admin@example.com".into(),
            password: String::new(),
            token: None,
            role: "admin".into(),
            status: "active".into(),
        }
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let keys = JwtKeys::new("secret", 3600);
        let now = Utc::now();
        let token = keys.issue(&user(), now).unwrap();

        let claims = keys.verify(&token, now + Duration::minutes(30)).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);

        let err = keys.verify(&token, now + Duration::hours(2)).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn rejects_foreign_signature_and_garbage() {
        let token = JwtKeys::new("one", 60).issue(&user(), Utc::now()).unwrap();
        let other = JwtKeys::new("two", 60);
        assert!(matches!(other.verify(&token, Utc::now()), Err(AppError::Unauthorized(_))));
        assert!(matches!(other.verify("not.a.jwt", Utc::now()), Err(AppError::Unauthorized(_))));
    }
}
