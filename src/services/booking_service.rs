use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::bookings::{self, BookingStatus};
use crate::models::dto::CreateBookingRequest;
use crate::models::properties::{self, PropertyCategory};
use crate::services::availability::{self, StayRange};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Demande de réservation validée (avant accès à la base)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedBooking {
    pub property_id: Uuid,
    pub range: StayRange,
    pub guests: i32,
}

pub struct BookingService;

impl BookingService {
    /// Validation sans I/O, dans l'ordre : id du logement, dates, voyageurs
    pub fn validate_request(request: &CreateBookingRequest) -> Result<ValidatedBooking, ApiError> {
        // 1. Identifiant du logement
        let property_id = Uuid::parse_str(request.property_id.trim())
            .map_err(|_| ApiError::validation("invalid property id"))?;

        // 2. Dates au format YYYY-MM-DD, checkout strictement après checkin
        let checkin = NaiveDate::parse_from_str(&request.checkin, DATE_FORMAT)
            .map_err(|_| ApiError::validation("invalid checkin date; use YYYY-MM-DD"))?;
        let checkout = NaiveDate::parse_from_str(&request.checkout, DATE_FORMAT)
            .map_err(|_| ApiError::validation("invalid checkout date; use YYYY-MM-DD"))?;
        let range = StayRange::new(checkin, checkout)
            .ok_or_else(|| ApiError::validation("checkout must be after checkin"))?;

        // 3. Au moins un voyageur
        if request.guests < 1 {
            return Err(ApiError::validation("guests must be at least 1"));
        }

        Ok(ValidatedBooking {
            property_id,
            range,
            guests: request.guests,
        })
    }

    /// Prix total = nuits * prix par nuit (jamais fourni par le client)
    pub fn total_amount(nights: i64, nightly_price: Decimal) -> Decimal {
        Decimal::from(nights) * nightly_price
    }

    /// Crée une réservation "pending"
    ///
    /// Vérification de disponibilité et insertion dans UNE transaction. La ligne
    /// du logement est verrouillée (SELECT ... FOR UPDATE) : deux réservations
    /// concurrentes du même logement passent l'une après l'autre, et la seconde
    /// voit la première une fois le verrou obtenu.
    pub async fn create_booking(
        db: &DatabaseConnection,
        config: &AppConfig,
        user_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<bookings::Model, ApiError> {
        let booking = Self::validate_request(&request)?;

        let txn = db.begin().await?;

        // Borne l'attente du verrou (PostgreSQL uniquement)
        if txn.get_database_backend() == DbBackend::Postgres {
            txn.execute_unprepared(&format!(
                "SET LOCAL lock_timeout = '{}ms'",
                config.booking_lock_timeout_ms
            ))
                .await?;
        }

        // 4. Le logement existe et est un shortlet (ligne verrouillée)
        let property = match properties::Entity::find_by_id(booking.property_id)
            .lock_exclusive()
            .one(&txn)
            .await?
        {
            Some(property) => property,
            None => {
                txn.rollback().await?;
                return Err(ApiError::not_found("property not found"));
            }
        };

        if property.category != PropertyCategory::Shortlet {
            txn.rollback().await?;
            return Err(ApiError::validation("property not bookable as shortlet"));
        }

        // 5. Nombre de nuits
        let nights = booking.range.nights();
        let nights_i32 = match i32::try_from(nights) {
            Ok(n) if n >= 1 => n,
            _ => {
                txn.rollback().await?;
                return Err(ApiError::validation("invalid date range"));
            }
        };

        // 6. Conflit avec une réservation pending/confirmed ?
        if availability::has_conflict(&txn, property.id, &booking.range).await? {
            txn.rollback().await?;
            tracing::info!(property_id = %property.id, %user_id, "booking conflict");
            return Err(ApiError::conflict("property not available for selected dates"));
        }

        // 7. Insérer la réservation
        let now = Utc::now();
        let created = bookings::ActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(property.id),
            user_id: Set(Some(user_id)),
            checkin: Set(booking.range.checkin()),
            checkout: Set(booking.range.checkout()),
            nights: Set(nights_i32),
            guests: Set(booking.guests),
            total_amount: Set(Self::total_amount(nights, property.price)),
            status: Set(BookingStatus::Pending),
            payment_ref: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
            .insert(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            booking_id = %created.id,
            property_id = %created.property_id,
            nights = created.nights,
            "booking created"
        );
        Ok(created)
    }

    /// Réservations de l'utilisateur, triées par date d'arrivée
    pub async fn list_user_bookings(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<bookings::Model>, ApiError> {
        let bookings = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .order_by_asc(bookings::Column::Checkin)
            .order_by_asc(bookings::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(bookings)
    }
}
