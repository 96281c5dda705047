use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::ApiError;
use crate::models::dto::PropertyFilter;
use crate::routes::parse_id;
use crate::services::property_service::PropertyService;

/// GET /properties?category=&area=&min_beds=&checkin=&checkout= (PUBLIC)
#[get("")]
pub async fn list_properties(
    filter: web::Query<PropertyFilter>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let properties = PropertyService::list_properties(db.get_ref(), filter.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "properties": properties })))
}

/// GET /properties/{id} - avec images (PUBLIC)
#[get("/{id}")]
pub async fn get_property(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "property")?;
    let property = PropertyService::get_property(db.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "property": property })))
}

pub fn properties_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .service(list_properties)
            .service(get_property)
    );
}
