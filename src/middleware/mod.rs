pub mod auth;

pub use auth::{AuthUser, require_admin};
