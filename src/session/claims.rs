use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Role,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: i64,
}

/// Reads the claims of a token without checking its signature.
///
/// Only used to render identity locally; the backend verifies the token on every call.
pub fn decode_unverified(token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let decoded = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AppError::Validation(format!("Invalid token: {e}")))?;
    Ok(decoded.claims)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token_expiry: DateTime<Utc>,
}

impl Session {
    pub fn from_claims(claims: Claims) -> AppResult<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Validation("Invalid user id in token".into()))?;
        let token_expiry = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::Validation("Invalid expiry in token".into()))?;
        Ok(Self {
            user_id,
            name: claims.name.unwrap_or_default(),
            email: claims.email.unwrap_or_default(),
            role: claims.role,
            token_expiry,
        })
    }

    pub fn from_token(token: &str) -> AppResult<Self> {
        decode_unverified(token).and_then(Self::from_claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token_expiry > now
    }
}
