// ============================================================================
// MODÈLE : EMAIL VERIFICATIONS
// ============================================================================
//
// Description:
//   Code à usage unique (6 chiffres) prouvant le contrôle d'une adresse email.
//
// Colonnes de la table email_verifications:
//   - email (VARCHAR, PRIMARY KEY) - une seule ligne par email
//   - code (VARCHAR(6), NOT NULL)
//   - expires_at (TIMESTAMPTZ, NOT NULL) - created_at + 10 minutes
//   - created_at (TIMESTAMPTZ, NOT NULL)
//
// Workflow:
//   1. POST /api/v1/auth/register ou /auth/resend-ver écrit (upsert) le code
//   2. Le code est envoyé par email
//   3. POST /api/v1/auth/verify compare email + code
//   4. Succès ou expiration : la ligne est supprimée
//
// Points d'attention:
//   - L'email est la clé primaire : l'écriture remplace l'ancien code
//     (un seul code actif par email, garanti par le stockage)
//   - Pas de FK vers users : la ligne est supprimée explicitement avec l'user
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_verifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,

    #[sea_orm(column_type = "String(StringLen::N(6))")]
    #[serde(skip_serializing)]
    pub code: String,

    pub expires_at: DateTimeUtc,

    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn is_expired(&self, now: DateTimeUtc) -> bool {
        now > self.expires_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
