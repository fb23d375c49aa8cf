//! Bearer token issuance and validation

use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::claims::{Claims, UserRole},
};

#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Whether book write routes demand an admin token
    pub fn protects_writes(&self) -> bool {
        self.config.protect_writes
    }

    /// Issue a signed token for the given identity
    pub fn issue(&self, user_id: i64, email: &str, role: UserRole) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            role,
            exp,
            iat: now,
            nbf: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        Claims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }
}
