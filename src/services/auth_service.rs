use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse, VerifyEmailRequest, VerifyResponse};
use crate::models::email_verifications;
use crate::models::users::{self, UserRole};
use crate::services::mail::{self, Mailer};
use crate::utils::{jwt, otp, password};

/// Fenêtre pour vérifier une inscription avant purge
const REGISTRATION_WINDOW_HOURS: i64 = 24;
/// Durée de vie d'un code OTP
const CODE_TTL_MINUTES: i64 = 10;

const DUPLICATE_EMAIL: &str = "a user with this email already exists";

pub struct AuthService;

impl AuthService {
    /// Inscription : utilisateur non vérifié + code OTP envoyé par email
    pub async fn register(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &Mailer,
        request: RegisterRequest,
    ) -> Result<users::Model, ApiError> {
        let now = Utc::now();

        // 1. Hash le mot de passe (hors transaction)
        let password_hash = password::hash_password(&request.password, config.password_iterations)
            .map_err(|e| ApiError::internal(format!("could not hash password: {}", e)))?;

        let txn = db.begin().await?;

        // 2. Vérifier si l'email existe déjà (une inscription abandonnée est purgée)
        if let Some(existing) = Self::find_by_email(&txn, &request.email).await? {
            if !existing.registration_expired(now) {
                txn.rollback().await?;
                return Err(ApiError::conflict(DUPLICATE_EMAIL));
            }
            tracing::info!(user_id = %existing.id, "purging expired registration");
            Self::purge_user(&txn, existing).await?;
        }

        // 3. Créer l'utilisateur non vérifié (24h pour vérifier) ; l'index unique
        //    sur l'email tranche entre deux inscriptions concurrentes
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email.clone()),
            password_hash: Set(password_hash),
            name: Set(request.name.clone()),
            role: Set(UserRole::User),
            is_verified: Set(false),
            expires_at: Set(Some(now + Duration::hours(REGISTRATION_WINDOW_HOURS))),
            created_at: Set(now),
            updated_at: Set(now),
        }
            .insert(&txn)
            .await
            .map_err(duplicate_email_as_conflict)?;

        // 4. Générer le code, dans la même transaction que l'utilisateur
        let code = Self::store_code(&txn, &user.email).await?;
        txn.commit().await.map_err(duplicate_email_as_conflict)?;

        mailer
            .send_logged(&user.email, "Verify your account", mail::verification_code_body(&code))
            .await;

        tracing::info!(user_id = %user.id, "user registered, verification pending");
        Ok(user)
    }

    /// Vérifie le code OTP ; la vérification vaut connexion (token renvoyé)
    pub async fn verify_email(
        db: &DatabaseConnection,
        config: &AppConfig,
        mailer: &Mailer,
        request: VerifyEmailRequest,
    ) -> Result<VerifyResponse, ApiError> {
        let now = Utc::now();

        // 1. Le code doit correspondre à l'enregistrement de cet email
        let record = email_verifications::Entity::find_by_id(request.email.clone())
            .one(db)
            .await?
            .filter(|record| record.code == request.code)
            .ok_or_else(|| ApiError::validation("invalid verification code"))?;

        // 2. Code expiré : supprimé
        if record.is_expired(now) {
            record.delete(db).await?;
            return Err(ApiError::validation("verification code expired"));
        }

        // 3. Utilisateur
        let user = Self::find_by_email(db, &request.email)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        // 4. Inscription abandonnée (plus de 24h) : purge
        if user.registration_expired(now) {
            tracing::info!(user_id = %user.id, "registration expired at verification");
            let txn = db.begin().await?;
            Self::purge_user(&txn, user).await?;
            txn.commit().await?;
            return Err(ApiError::validation("registration expired, please register again"));
        }

        // 5. Marquer vérifié + supprimer le code, atomiquement
        let txn = db.begin().await?;
        let mut active_user: users::ActiveModel = user.into();
        active_user.is_verified = Set(true);
        active_user.expires_at = Set(None);
        active_user.updated_at = Set(now);
        let user = active_user.update(&txn).await?;
        email_verifications::Entity::delete_by_id(request.email.clone())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        mailer
            .send_logged(
                &user.email,
                "Email Verification Successful",
                mail::verification_success_body(&user.name),
            )
            .await;

        // 6. Générer le JWT
        let token = Self::token_for(config, &user)?;
        tracing::info!(user_id = %user.id, "email verified");

        Ok(VerifyResponse {
            message: "Email verified successfully!".to_string(),
            user: user.into(),
            token,
        })
    }

    /// Renvoie un nouveau code (remplace l'ancien)
    pub async fn resend_verification(
        db: &DatabaseConnection,
        mailer: &Mailer,
        email: &str,
    ) -> Result<(), ApiError> {
        let user = Self::find_by_email(db, email)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        if user.is_verified {
            return Err(ApiError::validation("email is already verified"));
        }

        let code = Self::store_code(db, email).await?;
        mailer
            .send_logged(email, "Resend: Verify your account", mail::verification_code_body(&code))
            .await;

        Ok(())
    }

    /// Connexion : email exact + mot de passe + compte vérifié
    pub async fn login(
        db: &DatabaseConnection,
        config: &AppConfig,
        request: LoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        // 1. Trouver l'utilisateur
        let user = Self::find_by_email(db, &request.email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        // 2. Vérifier le mot de passe
        let is_valid = password::verify_password(&request.password, &user.password_hash)
            .map_err(|e| ApiError::internal(format!("password verification error: {}", e)))?;
        if !is_valid {
            return Err(ApiError::InvalidCredentials);
        }

        // 3. Compte vérifié obligatoire
        if !user.is_verified {
            return Err(ApiError::EmailNotVerified);
        }

        // 4. Générer le JWT
        let token = Self::token_for(config, &user)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
        })
    }

    pub async fn find_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(conn)
            .await
    }

    fn token_for(config: &AppConfig, user: &users::Model) -> Result<String, ApiError> {
        jwt::issue(user.id, user.role, &config.jwt_secret, config.token_ttl)
            .map_err(|e| ApiError::internal(format!("could not generate token: {}", e)))
    }

    /// Upsert du code : une seule ligne par email
    async fn store_code<C: ConnectionTrait>(conn: &C, email: &str) -> Result<String, DbErr> {
        let now = Utc::now();
        let code = otp::generate_otp();

        let record = email_verifications::ActiveModel {
            email: Set(email.to_string()),
            code: Set(code.clone()),
            expires_at: Set(now + Duration::minutes(CODE_TTL_MINUTES)),
            created_at: Set(now),
        };

        email_verifications::Entity::insert(record)
            .on_conflict(
                OnConflict::column(email_verifications::Column::Email)
                    .update_columns([
                        email_verifications::Column::Code,
                        email_verifications::Column::ExpiresAt,
                        email_verifications::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;

        Ok(code)
    }

    /// Supprime l'utilisateur et son code ; à appeler dans une transaction
    async fn purge_user<C: ConnectionTrait>(conn: &C, user: users::Model) -> Result<(), DbErr> {
        email_verifications::Entity::delete_by_id(user.email.clone())
            .exec(conn)
            .await?;
        user.delete(conn).await?;
        Ok(())
    }
}

/// Violation de l'index unique sur l'email -> 409 comme le contrôle préalable
fn duplicate_email_as_conflict(err: DbErr) -> ApiError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::conflict(DUPLICATE_EMAIL),
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "supersecret".to_string(),
            name: "Ada".to_string(),
        }
    }

    fn login_request(email: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: "supersecret".to_string(),
        }
    }

    async fn stored_code(db: &DatabaseConnection, email: &str) -> email_verifications::Model {
        email_verifications::Entity::find_by_id(email.to_string())
            .one(db)
            .await
            .unwrap()
            .expect("verification record")
    }

    #[tokio::test]
    async fn test_login_requires_verification_then_succeeds() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);

        let user = AuthService::register(&db, &config, &mailer, register_request("ada@example.com"))
            .await
            .unwrap();
        assert!(!user.is_verified);
        assert!(user.expires_at.is_some());

        // Avant vérification : refusé même avec le bon mot de passe
        let err = AuthService::login(&db, &config, login_request("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::EmailNotVerified));

        let record = stored_code(&db, "ada@example.com").await;
        let verified = AuthService::verify_email(
            &db,
            &config,
            &mailer,
            VerifyEmailRequest {
                email: "ada@example.com".to_string(),
                code: record.code,
            },
        )
            .await
            .unwrap();
        assert!(verified.user.is_verified);

        // Le code est consommé
        assert!(email_verifications::Entity::find_by_id("ada@example.com".to_string())
            .one(&db)
            .await
            .unwrap()
            .is_none());

        let auth = AuthService::login(&db, &config, login_request("ada@example.com")).await.unwrap();
        let claims = jwt::validate(&auth.token, &config.jwt_secret).unwrap();
        assert_eq!(claims.subject_id, user.id);
        assert_eq!(claims.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);
        AuthService::register(&db, &config, &mailer, register_request("bob@example.com")).await.unwrap();

        let err = AuthService::login(
            &db,
            &config,
            LoginRequest {
                email: "bob@example.com".to_string(),
                password: "not-the-password".to_string(),
            },
        )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));

        let err = AuthService::login(&db, &config, login_request("nobody@example.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);

        AuthService::register(&db, &config, &mailer, register_request("dup@example.com")).await.unwrap();
        let err = AuthService::register(&db, &config, &mailer, register_request("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_same_email() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);

        let (a, b) = tokio::join!(
            AuthService::register(&db, &config, &mailer, register_request("race@example.com")),
            AuthService::register(&db, &config, &mailer, register_request("race@example.com")),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results.iter().filter(|r| matches!(r, Err(ApiError::Conflict(_)))).count(),
            1
        );

        // un seul utilisateur, avec son code
        let users = users::Entity::find()
            .filter(users::Column::Email.eq("race@example.com"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(users, 1);
        stored_code(&db, "race@example.com").await;
    }

    #[tokio::test]
    async fn test_unique_email_violation_is_a_conflict() {
        let db = memory_db().await;
        let now = Utc::now();
        let user = |id: Uuid| users::ActiveModel {
            id: Set(id),
            email: Set("taken@example.com".to_string()),
            password_hash: Set("pbkdf2:sha256:1$AA$AA".to_string()),
            name: Set(String::new()),
            role: Set(UserRole::User),
            is_verified: Set(false),
            expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user(Uuid::new_v4()).insert(&db).await.unwrap();
        let err = user(Uuid::new_v4()).insert(&db).await.unwrap_err();
        assert!(matches!(duplicate_email_as_conflict(err), ApiError::Conflict(_)));

        let other = DbErr::Custom("boom".to_string());
        assert!(matches!(duplicate_email_as_conflict(other), ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_wrong_code_is_rejected() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);
        AuthService::register(&db, &config, &mailer, register_request("eve@example.com")).await.unwrap();

        let record = stored_code(&db, "eve@example.com").await;
        let wrong = if record.code == "000000" { "111111" } else { "000000" };

        let err = AuthService::verify_email(
            &db,
            &config,
            &mailer,
            VerifyEmailRequest {
                email: "eve@example.com".to_string(),
                code: wrong.to_string(),
            },
        )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_expired_code_is_deleted() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);
        AuthService::register(&db, &config, &mailer, register_request("old@example.com")).await.unwrap();

        let record = stored_code(&db, "old@example.com").await;
        let code = record.code.clone();
        let mut active: email_verifications::ActiveModel = record.into();
        active.expires_at = Set(Utc::now() - Duration::minutes(1));
        active.update(&db).await.unwrap();

        let err = AuthService::verify_email(
            &db,
            &config,
            &mailer,
            VerifyEmailRequest {
                email: "old@example.com".to_string(),
                code,
            },
        )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "verification code expired"));
        assert!(email_verifications::Entity::find_by_id("old@example.com".to_string())
            .one(&db)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_registration_is_purged() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);
        let user = AuthService::register(&db, &config, &mailer, register_request("late@example.com"))
            .await
            .unwrap();

        let mut active: users::ActiveModel = user.clone().into();
        active.expires_at = Set(Some(Utc::now() - Duration::hours(1)));
        active.update(&db).await.unwrap();

        let record = stored_code(&db, "late@example.com").await;
        let err = AuthService::verify_email(
            &db,
            &config,
            &mailer,
            VerifyEmailRequest {
                email: "late@example.com".to_string(),
                code: record.code,
            },
        )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(users::Entity::find_by_id(user.id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_over_expired_registration() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);
        let first = AuthService::register(&db, &config, &mailer, register_request("again@example.com"))
            .await
            .unwrap();

        let mut active: users::ActiveModel = first.clone().into();
        active.expires_at = Set(Some(Utc::now() - Duration::hours(1)));
        active.update(&db).await.unwrap();

        let second = AuthService::register(&db, &config, &mailer, register_request("again@example.com"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_resend_replaces_the_code() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mailer = Mailer::new(None);
        AuthService::register(&db, &config, &mailer, register_request("re@example.com")).await.unwrap();
        let before = stored_code(&db, "re@example.com").await;

        AuthService::resend_verification(&db, &mailer, "re@example.com").await.unwrap();

        let rows = email_verifications::Entity::find()
            .filter(email_verifications::Column::Email.eq("re@example.com"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].created_at >= before.created_at);
    }

    #[tokio::test]
    async fn test_resend_rules() {
        let db = memory_db().await;
        let mailer = Mailer::new(None);

        let err = AuthService::resend_verification(&db, &mailer, "ghost@example.com").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
