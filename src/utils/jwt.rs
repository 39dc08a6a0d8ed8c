use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::users;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub email: String,
    pub is_staff: bool,
    pub exp: i64,        // expiration timestamp
}

/// Issue a token for a user, valid for `JWT_TTL_HOURS`
pub fn generate_token(config: &AppConfig, user: &users::Model) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        is_staff: user.is_staff,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Check the signature and expiry of a token and return its claims
pub fn verify_token(config: &AppConfig, token: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_generate_and_verify_token() {
        let config = test_utils::test_config();
        let user = test_utils::user_model(123, "testuser", true);

        let token = generate_token(&config, &user).unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.email, "testuser@example.com");
        assert!(claims.is_staff);
    }

    #[test]
    fn test_invalid_token() {
        let config = test_utils::test_config();
        let result = verify_token(&config, "invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret() {
        let config = test_utils::test_config();
        let user = test_utils::user_model(1, "anna", false);
        let token = generate_token(&config, &user).unwrap();

        let other = AppConfig {
            jwt_secret: "another-secret".to_string(),
            ..config
        };
        assert!(verify_token(&other, &token).is_err());
    }
}
