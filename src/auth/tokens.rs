use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_AUDIENCE: &str = "session";
pub const RESET_AUDIENCE: &str = "password-reset";

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

/// Client half of a session. `sid` keys the server-side record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub sid: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(user_id: i64, session_id: Uuid, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            sid: session_id,
            aud: SESSION_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Password reset grant: user id plus issue time, valid until `exp`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResetClaims {
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl ResetClaims {
    pub fn new(user_id: i64, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            aud: RESET_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub fn encode_token<C: Serialize>(keys: &JwtKeys, claims: &C) -> Result<String, AppError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc).map_err(|err| {
        tracing::error!(error = %err, "token encoding failed");
        AppError::internal()
    })
}

/// Checks signature, audience and expiry with no leeway.
pub fn decode_token<C: DeserializeOwned>(
    keys: &JwtKeys,
    token: &str,
    audience: &str,
) -> Result<C, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_audience(&[audience]);

    decode::<C>(token, &keys.dec, &validation).map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{
        JwtKeys, RESET_AUDIENCE, ResetClaims, SESSION_AUDIENCE, SessionClaims, decode_token,
        encode_token,
    };

    #[test]
    fn session_token_roundtrips_with_same_secret() {
        let keys = JwtKeys::from_secret(b"unit-test-secret-key");
        let now = Utc::now();
        let claims = SessionClaims::new(42, Uuid::new_v4(), now, now + Duration::hours(1));
        let token = encode_token(&keys, &claims).expect("token should encode");

        let decoded: SessionClaims =
            decode_token(&keys, &token, SESSION_AUDIENCE).expect("token should decode");
        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id(), Some(42));
    }

    #[test]
    fn audiences_are_not_interchangeable() {
        let keys = JwtKeys::from_secret(b"unit-test-secret-key");
        let now = Utc::now();
        let reset = encode_token(&keys, &ResetClaims::new(1, now, now + Duration::hours(1)))
            .expect("token should encode");

        assert!(decode_token::<SessionClaims>(&keys, &reset, SESSION_AUDIENCE).is_err());
        assert!(decode_token::<ResetClaims>(&keys, &reset, RESET_AUDIENCE).is_ok());
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        let keys = JwtKeys::from_secret(b"unit-test-secret-key");
        let other = JwtKeys::from_secret(b"another-secret-key!!");
        let now = Utc::now();

        let expired = encode_token(
            &keys,
            &ResetClaims::new(1, now - Duration::hours(2), now - Duration::hours(1)),
        )
        .expect("token should encode");
        assert!(decode_token::<ResetClaims>(&keys, &expired, RESET_AUDIENCE).is_err());

        let foreign = encode_token(&other, &ResetClaims::new(1, now, now + Duration::hours(1)))
            .expect("token should encode");
        assert!(decode_token::<ResetClaims>(&keys, &foreign, RESET_AUDIENCE).is_err());
    }
}
