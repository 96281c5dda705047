mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{guard, web, App, HttpResponse, HttpServer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::services::mail::Mailer;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
}

/// Réponse aux requêtes CORS preflight (les en-têtes viennent de DefaultHeaders)
async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config)
        .await
        .map_err(std::io::Error::other)?;
    db::sync_schema(&db).await.map_err(std::io::Error::other)?;
    tracing::info!("database connected, schema ready");

    if config.mail.is_none() {
        tracing::warn!("SMTP_HOST not set, verification emails will only be logged");
    }
    let mailer = web::Data::new(Mailer::new(config.mail.clone()));

    let bind_address = (config.host.clone(), config.port);
    tracing::info!(host = %bind_address.0, port = bind_address.1, "starting server");

    let config = web::Data::new(config);
    let db = web::Data::new(db);

    HttpServer::new(move || {
        let cors = DefaultHeaders::new()
            .add(("Access-Control-Allow-Origin", config.cors_allowed_origin.clone()))
            .add(("Access-Control-Allow-Methods", "GET, POST, PATCH, DELETE, OPTIONS"))
            .add(("Access-Control-Allow-Headers", "Authorization, Content-Type"))
            .add(("Access-Control-Allow-Credentials", "true"));

        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(mailer.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .service(web::resource("/{tail:.*}").guard(guard::Options()).to(preflight))
            .configure(routes::configure_routes)
    })
        .bind(bind_address)?
        .run()
        .await
}
