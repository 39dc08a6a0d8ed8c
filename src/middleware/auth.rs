use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::users;
use crate::utils::jwt;

/// Authenticated requester, extracted from `Authorization: Token <jwt>`
/// (or `Bearer <jwt>`). Rejects the request with 401 when absent.
///
/// The token only names the user; `is_staff` and activity come from the
/// current `users` row, so demotion or deactivation applies immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub is_staff: bool,
}

/// Requester on endpoints that also serve anonymous callers.
/// A present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<i32> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { authenticate(&req).await?.ok_or_else(AppError::auth_required) })
    }
}

impl FromRequest for MaybeAuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { authenticate(&req).await.map(MaybeAuthUser) })
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid token.".to_string())
}

/// Verified claims, or `Ok(None)` when no Authorization header is sent
fn token_claims(req: &HttpRequest) -> Result<Option<jwt::Claims>, AppError> {
    // 1. Extract the Authorization header
    let Some(header) = req.headers().get("Authorization") else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    // 2. Strip the scheme ("Token <jwt>" or "Bearer <jwt>")
    let token = header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid Authorization format (expected: Token <token>)".to_string(),
            )
        })?;

    // 3. Verify the JWT
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::Internal("AppConfig is not registered".to_string()))?;

    let claims = jwt::verify_token(config, token.trim()).map_err(|e| {
        warn!(error = %e, path = %req.path(), "rejected token");
        invalid_token()
    })?;

    Ok(Some(claims))
}

async fn authenticate(req: &HttpRequest) -> Result<Option<AuthUser>, AppError> {
    let Some(claims) = token_claims(req)? else {
        return Ok(None);
    };

    // 4. Load the account the token names
    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .ok_or_else(|| AppError::Internal("DatabaseConnection is not registered".to_string()))?;

    let user = users::Entity::find_by_id(claims.sub).one(db.get_ref()).await?;
    let Some(user) = user.filter(|u| u.is_active) else {
        warn!(user_id = claims.sub, path = %req.path(), "token for a missing or inactive user");
        return Err(invalid_token());
    };

    Ok(Some(AuthUser {
        user_id: user.id,
        email: user.email,
        is_staff: user.is_staff,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use actix_web::test::TestRequest;
    use sea_orm::{ActiveModelTrait, ModelTrait, Set};

    fn request(db: &DatabaseConnection, header: Option<String>) -> HttpRequest {
        let mut req = TestRequest::get()
            .uri("/api/recipes/")
            .app_data(web::Data::new(test_utils::test_config()))
            .app_data(web::Data::new(db.clone()));
        if let Some(value) = header {
            req = req.insert_header(("Authorization", value));
        }
        req.to_http_request()
    }

    fn bearer(scheme: &str, user: &users::Model) -> Option<String> {
        let token = jwt::generate_token(&test_utils::test_config(), user).unwrap();
        Some(format!("{scheme} {token}"))
    }

    #[actix_web::test]
    async fn test_missing_header_is_anonymous() {
        let db = test_utils::setup_db().await;
        assert!(authenticate(&request(&db, None)).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_token_and_bearer_schemes() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;

        for scheme in ["Token", "Bearer"] {
            let auth = authenticate(&request(&db, bearer(scheme, &user)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(auth.user_id, user.id);
            assert!(!auth.is_staff);
        }
    }

    #[actix_web::test]
    async fn test_garbage_token_is_rejected() {
        let db = test_utils::setup_db().await;

        let result = authenticate(&request(&db, Some("Token nope".to_string()))).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let result = authenticate(&request(&db, Some("Basic abc".to_string()))).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn test_staff_flag_follows_current_row() {
        let db = test_utils::setup_db().await;
        let admin = test_utils::create_user(&db, "admin", true).await;
        let header = bearer("Token", &admin);

        let mut demoted: users::ActiveModel = admin.into();
        demoted.is_staff = Set(false);
        demoted.update(&db).await.unwrap();

        let auth = authenticate(&request(&db, header)).await.unwrap().unwrap();
        assert!(!auth.is_staff);
    }

    #[actix_web::test]
    async fn test_inactive_or_deleted_user_is_rejected() {
        let db = test_utils::setup_db().await;
        let anna = test_utils::create_user(&db, "anna", false).await;
        let boris = test_utils::create_user(&db, "boris", false).await;
        let anna_header = bearer("Token", &anna);
        let boris_header = bearer("Token", &boris);

        let mut inactive: users::ActiveModel = anna.into();
        inactive.is_active = Set(false);
        inactive.update(&db).await.unwrap();
        let result = authenticate(&request(&db, anna_header)).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        boris.delete(&db).await.unwrap();
        let result = authenticate(&request(&db, boris_header)).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
