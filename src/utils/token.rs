use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ErrorMessage;

/// Claims carried by a session token: identity, role, and an absolute expiry.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub sub: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(
    user_id: &str,
    role: &str,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::minutes(expires_in_minutes)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token(token: &str, secret: &[u8]) -> Result<TokenClaims, ErrorMessage> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ErrorMessage::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn token_round_trip_preserves_identity_and_role() {
        let token = create_token("user-1", "speaker", SECRET, 60).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "speaker");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("user-1", "admin", SECRET, -120).unwrap();
        assert_eq!(decode_token(&token, SECRET), Err(ErrorMessage::InvalidToken));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token("user-1", "admin", b"other-secret", 60).unwrap();
        assert_eq!(decode_token(&token, SECRET), Err(ErrorMessage::InvalidToken));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(
            decode_token("definitely.not.a-jwt", SECRET),
            Err(ErrorMessage::InvalidToken)
        );
    }
}
