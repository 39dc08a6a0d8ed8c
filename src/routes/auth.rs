use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{LoginRequest, TokenResponse};
use crate::services::user_service::UserService;

/// POST /api/auth/token/login - Exchange email and password for a token (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let auth_token = UserService::login(&db, &config, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { auth_token }))
}

/// POST /api/auth/token/logout - Tokens are stateless; the client drops its copy
#[post("/logout")]
pub async fn logout(user: AuthUser) -> HttpResponse {
    info!(user_id = user.user_id, "user logged out");
    HttpResponse::NoContent().finish()
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth/token")
            .service(login)
            .service(logout),
    );
}
