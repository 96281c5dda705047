pub mod auth_service;
pub mod availability;
pub mod booking_service;
pub mod mail;
pub mod property_service;
pub mod user_service;
