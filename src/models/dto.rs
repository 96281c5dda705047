// DTOs : corps des requêtes et réponses JSON
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{bookings, properties, property_images, users};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(equal = 6, message = "code must be 6 digits"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
}

/// Vue publique d'un utilisateur (jamais le hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: users::UserRole,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ImageInput {
    #[validate(length(min = 1, message = "image url is required"))]
    pub url: String,
    #[serde(default)]
    pub alt_text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: properties::PropertyCategory,
    pub price: Decimal,
    pub currency: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "bedrooms cannot be negative"))]
    pub bedrooms: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "bathrooms cannot be negative"))]
    pub bathrooms: i32,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub party_allowed: bool,
    #[serde(default)]
    pub instant_book: bool,
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<ImageInput>,
}

/// PATCH : seuls les champs présents sont modifiés
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<properties::PropertyCategory>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub address: Option<String>,
    pub area: Option<String>,
    #[validate(range(min = 0, message = "bedrooms cannot be negative"))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, message = "bathrooms cannot be negative"))]
    pub bathrooms: Option<i32>,
    pub furnished: Option<bool>,
    pub party_allowed: Option<bool>,
    pub instant_book: Option<bool>,
}

/// Filtres de GET /properties (tout en texte, validé par le service)
#[derive(Debug, Default, Deserialize)]
pub struct PropertyFilter {
    pub category: Option<String>,
    pub area: Option<String>,
    pub min_beds: Option<i32>,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyWithImages {
    #[serde(flatten)]
    pub property: properties::Model,
    pub images: Vec<property_images::Model>,
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

/// nights / total_amount ne sont JAMAIS acceptés du client
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub property_id: String,
    pub checkin: String,  // "YYYY-MM-DD"
    pub checkout: String, // "YYYY-MM-DD"
    pub guests: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking: bookings::Model,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingsResponse {
    pub bookings: Vec<bookings::Model>,
}

// ---------------------------------------------------------------------------
// Admin users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPage {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub users: Vec<UserResponse>,
}
