// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - dto : Data Transfer Objects (requêtes / réponses API)
//   - users : Utilisateurs (rôle admin | agent | user, vérification email)
//   - email_verifications : Codes OTP (un seul par email, expire 10 min)
//   - properties : Logements (buy | rent | shortlet)
//   - property_images : Images ordonnées d'un logement
//   - bookings : Réservations [checkin, checkout) des shortlets
//
// Points d'attention:
//   - Identifiants UUID partout
//   - Les enums sont stockés en texte (portable PostgreSQL / SQLite)
//
// ============================================================================

pub mod health;
pub mod dto;
pub mod users;
pub mod email_verifications;
pub mod properties;
pub mod property_images;
pub mod bookings;
