use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User ID
    pub exp: usize,  // Expiration timestamp
}

/// Sign a new JWT token for a user.
pub fn sign(user_id: i32, username: &str, secret: &str, ttl_days: i64) -> Result<String> {
    let expiration = (Utc::now() + Duration::days(ttl_days)).timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let token = sign(7, "alice", "test_secret", 1).unwrap();
        let claims = verify(&token, "test_secret").unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign(7, "alice", "test_secret", 1).unwrap();
        assert!(verify(&token, "other_secret").is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let token = sign(7, "alice", "test_secret", -1).unwrap();
        assert!(verify(&token, "test_secret").is_err());
    }
}
