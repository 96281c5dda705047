use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::users::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // user_id (UUID)
    pub role: String,
    pub iat: i64,     // issued-at timestamp
    pub exp: i64,     // expiration timestamp
}

/// Identité extraite d'un token valide
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub subject_id: Uuid,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Génère un JWT HS256 pour un utilisateur
pub fn issue(subject_id: Uuid, role: UserRole, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Signing("failed to calculate expiration".to_string()))?;

    let claims = Claims {
        sub: subject_id.to_string(),
        role: role.as_str().to_string(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
        .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Vérifie et décode un JWT ; tout autre algorithme que HS256 est refusé
pub fn validate(token: &str, secret: &str) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;

    let subject_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Malformed)?;
    let role = UserRole::parse(&claims.role).ok_or(TokenError::Malformed)?;
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

    Ok(TokenClaims {
        subject_id,
        role,
        expires_at,
    })
}
