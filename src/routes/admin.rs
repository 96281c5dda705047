use actix_web::middleware::from_fn;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::models::dto::{CreatePropertyRequest, PageQuery, UpdatePropertyRequest};
use crate::routes::parse_id;
use crate::services::property_service::PropertyService;
use crate::services::user_service::UserService;

/// POST /admin/properties - Créer un logement (+ images)
#[post("/properties")]
pub async fn create_property(
    body: web::Json<CreatePropertyRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    let property = PropertyService::create_property(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "property": property })))
}

/// PATCH /admin/properties/{id} - Mise à jour partielle
#[patch("/properties/{id}")]
pub async fn update_property(
    path: web::Path<String>,
    body: web::Json<UpdatePropertyRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "property")?;
    body.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    let property = PropertyService::update_property(db.get_ref(), id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "property": property })))
}

#[delete("/properties/{id}")]
pub async fn delete_property(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "property")?;
    PropertyService::delete_property(db.get_ref(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /admin/users?page=&limit=
#[get("/users")]
pub async fn list_users(
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let page = UserService::list_users(db.get_ref(), query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/users/{id}")]
pub async fn get_user(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "user")?;
    let user = UserService::get_user(db.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": user })))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "user")?;
    UserService::delete_user(db.get_ref(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Tout le scope passe par require_admin (401/403 avant lecture du body)
pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(from_fn(require_admin))
            .service(create_property)
            .service(update_property)
            .service(delete_property)
            .service(list_users)
            .service(get_user)
            .service(delete_user)
    );
}
