use actix_web::{get, post, web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait};
use validator::Validate;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    LoginRequest, MessageResponse, RegisterRequest, ResendVerificationRequest, UserResponse, VerifyEmailRequest,
};
use crate::models::users::Entity as Users;
use crate::services::auth_service::AuthService;
use crate::services::mail::Mailer;

fn validate_body<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate().map_err(|e| ApiError::validation(e.to_string()))
}

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, ApiError> {
    validate_body(&*body)?;
    AuthService::register(db.get_ref(), config.get_ref(), mailer.get_ref(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "Registration successful. Please verify your email.".to_string(),
    }))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    validate_body(&*body)?;
    let response = AuthService::login(db.get_ref(), config.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/verify - Valider le code OTP, renvoie un token (PUBLIC)
#[post("/verify")]
pub async fn verify(
    body: web::Json<VerifyEmailRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, ApiError> {
    validate_body(&*body)?;
    let response =
        AuthService::verify_email(db.get_ref(), config.get_ref(), mailer.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/resend-ver - Renvoyer un code (PUBLIC)
#[post("/resend-ver")]
pub async fn resend_verification(
    body: web::Json<ResendVerificationRequest>,
    db: web::Data<DatabaseConnection>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, ApiError> {
    validate_body(&*body)?;
    AuthService::resend_verification(db.get_ref(), mailer.get_ref(), &body.email).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Verification code resent. Please check your email.".to_string(),
    }))
}

/// GET /auth/me - Utilisateur courant (PROTÉGÉE)
#[get("/me")]
pub async fn me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = Users::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or(ApiError::InvalidToken)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user": UserResponse::from(user)
    })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(verify)
            .service(resend_verification)
            .service(me)
    );
}
