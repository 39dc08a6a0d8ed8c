use actix_web::{get, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::AppError;
use crate::middleware::{AuthUser, Policy};
use crate::models::dto::{CreateIngredientRequest, IngredientSearchQuery};
use crate::services::catalogue_service::CatalogueService;

/// GET /api/ingredients?name=<prefix> - Ingredients ordered by name
#[get("")]
pub async fn list_ingredients(
    query: web::Query<IngredientSearchQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let ingredients = CatalogueService::ingredients(&db, query.name.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ingredients))
}

#[get("/{id:\\d+}")]
pub async fn get_ingredient(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(CatalogueService::ingredient(&db, path.into_inner()).await?))
}

/// POST /api/ingredients - Staff only
#[post("")]
pub async fn create_ingredient(
    req: HttpRequest,
    user: AuthUser,
    body: web::Json<CreateIngredientRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Policy::AdminOrReadOnly.enforce(req.method(), &user, None)?;
    let ingredient = CatalogueService::create_ingredient(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ingredient))
}

pub fn ingredient_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ingredients")
            .service(list_ingredients)
            .service(get_ingredient)
            .service(create_ingredient),
    );
}
