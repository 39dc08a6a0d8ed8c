mod config;
mod db;
mod errors;
mod logging;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod test_utils;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{App, HttpServer, web};
use tracing::{error, info};

use crate::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        std::io::Error::other(e)
    })?;

    info!("Connecting to database...");
    let db = db::establish_connection(&config).await.map_err(|e| {
        error!(error = %e, "failed to connect to database");
        std::io::Error::other(e)
    })?;
    db::create_schema(&db).await.map_err(|e| {
        error!(error = %e, "failed to create schema");
        std::io::Error::other(e)
    })?;
    info!("Database connected");

    let bind = (config.host.clone(), config.port);
    info!("Starting server on http://{}:{}", bind.0, bind.1);

    let db = web::Data::new(db);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind)?
        .run()
        .await
}
