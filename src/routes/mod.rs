pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod properties;

use actix_web::{error, web};

use crate::error::ApiError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/api/v1")
                .service(health::health_check)
                .configure(auth::auth_routes)
                .configure(properties::properties_routes)
                .configure(bookings::bookings_routes)
                .configure(admin::admin_routes)
        );
}

/// Corps JSON invalide -> 400 {"error": ...}
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "expected application/json".to_string(),
            other => format!("invalid request body: {}", other),
        };
        ApiError::validation(message).into()
    })
}

/// Query string invalide -> 400 {"error": ...}
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::validation(format!("invalid query: {}", err)).into())
}

/// Identifiant UUID dans le chemin
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("invalid {} id", what)))
}
