use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::middleware::{AuthUser, MaybeAuthUser, Policy};
use crate::models::dto::{CreateRecipeRequest, UpdateRecipeRequest};
use crate::routes::paginated;
use crate::services::bookmark_service::Bookmark;
use crate::services::recipe_service::{RecipeFilters, RecipeService};
use crate::services::shopping_list_service::{ShoppingListService, SHOPPING_LIST_FILENAME};
use crate::utils::pagination::PageQuery;

/// GET /api/recipes - Paginated recipes, filterable by author, tags and the viewer's lists
#[get("")]
pub async fn list_recipes(
    req: HttpRequest,
    viewer: MaybeAuthUser,
    page: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let page = page.resolve(config.page_size)?;
    let filters = RecipeFilters::from_query(req.query_string())?;

    let (count, recipes) = RecipeService::list(&db, &config, &filters, viewer.user_id(), page).await?;
    Ok(paginated(&req, page, count, recipes))
}

/// POST /api/recipes - Publish a recipe as the requester
#[post("")]
pub async fn create_recipe(
    user: AuthUser,
    body: web::Json<CreateRecipeRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let recipe = RecipeService::create(&db, &config, user.user_id, body.into_inner()).await?;
    let response = RecipeService::render(&db, &config, recipe, Some(user.user_id)).await?;
    Ok(HttpResponse::Created().json(response))
}

/// GET /api/recipes/download_shopping_cart - Aggregated shopping list as a text file
#[get("/download_shopping_cart")]
pub async fn download_shopping_cart(
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let items = ShoppingListService::aggregate(&db, user.user_id).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(SHOPPING_LIST_FILENAME.to_string())],
        })
        .body(ShoppingListService::render(&items)))
}

#[get("/{id:\\d+}")]
pub async fn get_recipe(
    path: web::Path<i32>,
    viewer: MaybeAuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let recipe = RecipeService::get(&db, path.into_inner()).await?;
    let response = RecipeService::render(&db, &config, recipe, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// PATCH /api/recipes/{id} - Partial update (author or staff)
#[patch("/{id:\\d+}")]
pub async fn update_recipe(
    req: HttpRequest,
    path: web::Path<i32>,
    user: AuthUser,
    body: web::Json<UpdateRecipeRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let recipe = RecipeService::get(&db, path.into_inner()).await?;
    Policy::AuthorOrAdminOrReadOnly.enforce(req.method(), &user, Some(recipe.author_id))?;

    let recipe = RecipeService::update(&db, &config, recipe, body.into_inner()).await?;
    let response = RecipeService::render(&db, &config, recipe, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /api/recipes/{id} - Author or staff
#[delete("/{id:\\d+}")]
pub async fn delete_recipe(
    req: HttpRequest,
    path: web::Path<i32>,
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let recipe = RecipeService::get(&db, path.into_inner()).await?;
    Policy::AuthorOrAdminOrReadOnly.enforce(req.method(), &user, Some(recipe.author_id))?;

    RecipeService::delete(&db, &config, recipe).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_bookmark(
    bookmark: Bookmark,
    recipe_id: i32,
    user: &AuthUser,
    db: &DatabaseConnection,
    config: &AppConfig,
) -> Result<HttpResponse, AppError> {
    let recipe = bookmark.add(db, user.user_id, recipe_id).await?;
    Ok(HttpResponse::Created().json(RecipeService::short(config, &recipe)))
}

async fn remove_bookmark(
    bookmark: Bookmark,
    recipe_id: i32,
    user: &AuthUser,
    db: &DatabaseConnection,
) -> Result<HttpResponse, AppError> {
    bookmark.remove(db, user.user_id, recipe_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/{id:\\d+}/favorite")]
pub async fn add_favorite(
    path: web::Path<i32>,
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    add_bookmark(Bookmark::Favorite, path.into_inner(), &user, &db, &config).await
}

#[delete("/{id:\\d+}/favorite")]
pub async fn remove_favorite(
    path: web::Path<i32>,
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    remove_bookmark(Bookmark::Favorite, path.into_inner(), &user, &db).await
}

#[post("/{id:\\d+}/shopping_cart")]
pub async fn add_to_shopping_cart(
    path: web::Path<i32>,
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    add_bookmark(Bookmark::ShoppingCart, path.into_inner(), &user, &db, &config).await
}

#[delete("/{id:\\d+}/shopping_cart")]
pub async fn remove_from_shopping_cart(
    path: web::Path<i32>,
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    remove_bookmark(Bookmark::ShoppingCart, path.into_inner(), &user, &db).await
}

pub fn recipe_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/recipes")
            .service(list_recipes)
            .service(create_recipe)
            .service(download_shopping_cart)
            .service(get_recipe)
            .service(update_recipe)
            .service(delete_recipe)
            .service(add_favorite)
            .service(remove_favorite)
            .service(add_to_shopping_cart)
            .service(remove_from_shopping_cart),
    );
}
