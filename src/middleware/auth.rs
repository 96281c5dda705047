use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, ResponseError, web};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::users::{Entity as Users, UserRole};
use crate::utils::jwt;

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole, // relu en base à chaque requête, jamais pris du token
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Extrait le token du header (format: "Bearer <token>", schéma insensible à la casse)
pub fn bearer_token(header: Option<&str>) -> Result<&str, ApiError> {
    let header = header.ok_or(ApiError::AuthenticationRequired)?;

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(ApiError::AuthenticationRequired),
    }
}

/// Header -> token -> JWT -> utilisateur en base
pub async fn resolve_identity(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    // 1. Réutiliser l'identité déjà résolue par le middleware admin
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    // 2. Extraire le token du header Authorization
    let header = match req.headers().get("Authorization") {
        Some(value) => Some(value.to_str().map_err(|_| ApiError::AuthenticationRequired)?),
        None => None,
    };
    let token = bearer_token(header)?;

    // 3. Vérifier le token JWT
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| ApiError::internal("AppConfig is not registered"))?;
    let claims = jwt::validate(token, &config.jwt_secret).map_err(|_| ApiError::InvalidToken)?;

    // 4. L'utilisateur doit toujours exister (même erreur qu'un mauvais token)
    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .ok_or_else(|| ApiError::internal("DatabaseConnection is not registered"))?;
    let user = Users::find_by_id(claims.subject_id)
        .one(db.get_ref())
        .await?
        .ok_or(ApiError::InvalidToken)?;

    if user.role != claims.role {
        tracing::debug!(
            user_id = %user.id,
            token_role = claims.role.as_str(),
            current_role = user.role.as_str(),
            token_expires_at = %claims.expires_at,
            "role changed since token was issued"
        );
    }

    let auth_user = AuthUser {
        user_id: user.id,
        role: user.role,
    };
    req.extensions_mut().insert(auth_user.clone());

    Ok(auth_user)
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { resolve_identity(&req).await })
    }
}

/// Middleware du scope /admin : identité + rôle admin, AVANT tout extracteur du handler
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let refusal = match resolve_identity(req.request()).await {
        Ok(user) if user.is_admin() => None,
        Ok(user) => {
            tracing::warn!(user_id = %user.user_id, path = %req.path(), "admin route refused");
            Some(ApiError::Forbidden)
        }
        Err(e) => Some(e),
    };

    if let Some(err) = refusal {
        let response = err.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
