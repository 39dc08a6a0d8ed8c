pub mod auth;
pub mod health;
pub mod ingredients;
pub mod media;
pub mod recipes;
pub mod tags;
pub mod users;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::errors::AppError;
use crate::utils::pagination::{Page, PageRequest};

/// Every route, plus the extractor configs that turn malformed input into 400s.
/// Requests are expected to pass through `NormalizePath::trim()`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/api")
                .service(health::health_check)
                .configure(auth::auth_routes)
                .configure(users::user_routes)
                .configure(tags::tag_routes)
                .configure(ingredients::ingredient_routes)
                .configure(recipes::recipe_routes),
        );
    media::media_routes(cfg);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid JSON payload: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid query string: {}", err)).into())
}

fn paginated<T: Serialize>(req: &HttpRequest, page: PageRequest, count: u64, results: Vec<T>) -> HttpResponse {
    HttpResponse::Ok().json(Page::new(req, page, count, results))
}
