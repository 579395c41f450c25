use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username of the authenticated account.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_token(username: &str, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        exp: (now + Duration::seconds(config.jwt_ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:5173".into(),
            jwt_secret: secret.into(),
            jwt_ttl_secs: 3600,
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.5-flash".into(),
            gemini_api_base: "http://127.0.0.1:9".into(),
            ai_timeout_secs: 1,
        }
    }

    #[test]
    fn test_token_subject_is_username() {
        let config = test_config("unit-test-secret");
        let token = create_token("alice", &config).unwrap();
        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, "alice");
        assert!(data.claims.exp > data.claims.iat);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let token = create_token("alice", &test_config("secret-a")).unwrap();
        let result = verify_token(&token, &test_config("secret-b"));
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = verify_token("not.a.jwt", &test_config("secret"));
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
