use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::middleware::{AuthUser, MaybeAuthUser, Policy};
use crate::models::dto::{
    CreatedUserResponse, RecipesLimitQuery, RegisterRequest, SetPasswordRequest, UpdateProfileRequest,
};
use crate::routes::paginated;
use crate::services::subscription_service::SubscriptionService;
use crate::services::user_service::UserService;
use crate::utils::pagination::PageQuery;

/// GET /api/users - Paginated user profiles
#[get("")]
pub async fn list_users(
    req: HttpRequest,
    viewer: MaybeAuthUser,
    page: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let page = page.resolve(config.page_size)?;
    let (count, users) = UserService::list(&db, viewer.user_id(), page).await?;
    Ok(paginated(&req, page, count, users))
}

/// POST /api/users - Register (PUBLIC)
#[post("")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::register(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(CreatedUserResponse::from(user)))
}

/// GET /api/users/me - Profile of the requester
#[get("/me")]
pub async fn me(user: AuthUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let profile = UserService::get(&db, user.user_id).await?;
    let response = UserService::render(&db, profile, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/users/set_password - Change the requester's password
#[post("/set_password")]
pub async fn set_password(
    user: AuthUser,
    body: web::Json<SetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    UserService::set_password(&db, user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/users/subscriptions - Authors the requester follows, with their recipes
#[get("/subscriptions")]
pub async fn subscriptions(
    req: HttpRequest,
    user: AuthUser,
    page: web::Query<PageQuery>,
    limit: web::Query<RecipesLimitQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let page = page.resolve(config.page_size)?;
    let (count, authors) =
        SubscriptionService::list(&db, &config, user.user_id, page, limit.recipes_limit).await?;
    Ok(paginated(&req, page, count, authors))
}

#[get("/{id:\\d+}")]
pub async fn get_user(
    path: web::Path<i32>,
    viewer: MaybeAuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::get(&db, path.into_inner()).await?;
    let response = UserService::render(&db, user, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// PATCH /api/users/{id} - Update first/last name (owner only)
#[patch("/{id:\\d+}")]
pub async fn update_user(
    req: HttpRequest,
    path: web::Path<i32>,
    user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let target = UserService::get(&db, path.into_inner()).await?;
    Policy::OwnerOrReadOnly.enforce(req.method(), &user, Some(target.id))?;

    let updated = UserService::update_profile(&db, target, body.into_inner()).await?;
    let response = UserService::render(&db, updated, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/users/{id}/subscribe - Follow an author
#[post("/{id:\\d+}/subscribe")]
pub async fn subscribe(
    path: web::Path<i32>,
    user: AuthUser,
    limit: web::Query<RecipesLimitQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let author = SubscriptionService::subscribe(&db, user.user_id, path.into_inner()).await?;
    let response = SubscriptionService::enrich(&db, &config, author, true, limit.recipes_limit).await?;
    Ok(HttpResponse::Created().json(response))
}

/// DELETE /api/users/{id}/subscribe - Stop following an author
#[delete("/{id:\\d+}/subscribe")]
pub async fn unsubscribe(
    path: web::Path<i32>,
    user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    SubscriptionService::unsubscribe(&db, user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(list_users)
            .service(register)
            .service(me)
            .service(set_password)
            .service(subscriptions)
            .service(get_user)
            .service(update_user)
            .service(subscribe)
            .service(unsubscribe),
    );
}
