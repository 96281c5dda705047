// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Configuration du processus, lue UNE SEULE FOIS au démarrage (après
//   dotenv) puis partagée via web::Data<AppConfig>. Aucun code métier ne lit
//   l'environnement directement.
//
// Variables:
//   - DATABASE_URL (obligatoire)
//   - HOST / PORT (défaut 127.0.0.1:8080)
//   - JWT_SECRET (défaut "dev_secret", INSECURE)
//   - TOKEN_TTL_HOURS (défaut 168 = 7 jours)
//   - CORS_ALLOWED_ORIGIN (défaut http://localhost:3000)
//   - PASSWORD_ITERATIONS (défaut 260000)
//   - BOOKING_LOCK_TIMEOUT_MS (défaut 5000)
//   - SMTP_HOST / SMTP_USER / SMTP_PASS / EMAIL_FROM (mail désactivé sans SMTP_HOST)
//
// ============================================================================

use chrono::Duration;
use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev_secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub cors_allowed_origin: String,
    pub password_iterations: u32,
    pub booking_lock_timeout_ms: u64,
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    /// Construit la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret (INSECURE)");
                DEV_JWT_SECRET.to_string()
            }
        };

        let mail = match env::var("SMTP_HOST") {
            Ok(smtp_host) if !smtp_host.is_empty() => Some(MailConfig {
                smtp_host,
                smtp_user: env::var("SMTP_USER").unwrap_or_default(),
                smtp_pass: env::var("SMTP_PASS").unwrap_or_default(),
                from: env::var("EMAIL_FROM").map_err(|_| ConfigError::Missing("EMAIL_FROM"))?,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            jwt_secret,
            token_ttl: Duration::hours(parse_var("TOKEN_TTL_HOURS", 168)?),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            password_iterations: parse_var("PASSWORD_ITERATIONS", 260_000)?,
            booking_lock_timeout_ms: parse_var("BOOKING_LOCK_TIMEOUT_MS", 5_000)?,
            mail,
        })
    }

    /// Configuration pour les tests : SQLite en mémoire, pas de mail, hash rapide
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            token_ttl: Duration::hours(1),
            cors_allowed_origin: "http://localhost:3000".to_string(),
            password_iterations: 1_000,
            booking_lock_timeout_ms: 5_000,
            mail: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
