use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{BookingResponse, BookingsResponse, CreateBookingRequest};
use crate::services::booking_service::BookingService;

/// POST /bookings - Réserver un shortlet (PROTÉGÉE)
pub async fn create_booking(
    auth_user: AuthUser,
    request: web::Json<CreateBookingRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let booking =
        BookingService::create_booking(db.get_ref(), config.get_ref(), auth_user.user_id, request.into_inner())
            .await?;

    Ok(HttpResponse::Created().json(BookingResponse { booking }))
}

/// GET /bookings - Réservations de l'utilisateur courant (PROTÉGÉE)
pub async fn list_user_bookings(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let bookings = BookingService::list_user_bookings(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(BookingsResponse { bookings }))
}

pub fn bookings_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(list_user_bookings))
    );
}
