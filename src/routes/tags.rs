use actix_web::{get, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::AppError;
use crate::middleware::{AuthUser, Policy};
use crate::models::dto::CreateTagRequest;
use crate::services::catalogue_service::CatalogueService;

/// GET /api/tags - All tags ordered by name
#[get("")]
pub async fn list_tags(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(CatalogueService::tags(&db).await?))
}

#[get("/{id:\\d+}")]
pub async fn get_tag(path: web::Path<i32>, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(CatalogueService::tag(&db, path.into_inner()).await?))
}

/// POST /api/tags - Staff only
#[post("")]
pub async fn create_tag(
    req: HttpRequest,
    user: AuthUser,
    body: web::Json<CreateTagRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    Policy::AdminOrReadOnly.enforce(req.method(), &user, None)?;
    let tag = CatalogueService::create_tag(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(tag))
}

pub fn tag_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tags")
            .service(list_tags)
            .service(get_tag)
            .service(create_tag),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::configure_routes;
    use crate::test_utils;
    use actix_web::http::StatusCode;
    use actix_web::middleware::NormalizePath;
    use actix_web::{test, App};
    use crate::models::users;
    use sea_orm::{ActiveModelTrait, Set};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_tag_catalogue() {
        let db = test_utils::setup_db().await;
        let cook = test_utils::create_user(&db, "cook", false).await;
        let admin = test_utils::create_user(&db, "admin", true).await;
        test_utils::create_tag(&db, "lunch").await;
        let app = test::init_service(
            App::new()
                .wrap(NormalizePath::trim())
                .app_data(web::Data::new(db.clone()))
                .app_data(web::Data::new(test_utils::test_config()))
                .configure(configure_routes),
        )
        .await;

        let payload = json!({"name": "Breakfast", "color": "#E26C2D", "slug": "breakfast"});

        let req = test::TestRequest::post()
            .uri("/api/tags/")
            .insert_header(test_utils::auth_header(&cook))
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/tags/")
            .insert_header(test_utils::auth_header(&admin))
            .set_json(&payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/tags/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let slugs: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["breakfast", "lunch"]);

        let req = test::TestRequest::get().uri("/api/tags/999/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_demoted_or_deactivated_admin_loses_access() {
        let db = test_utils::setup_db().await;
        let admin = test_utils::create_user(&db, "admin", true).await;
        let header = test_utils::auth_header(&admin);
        let app = test::init_service(
            App::new()
                .wrap(NormalizePath::trim())
                .app_data(web::Data::new(db.clone()))
                .app_data(web::Data::new(test_utils::test_config()))
                .configure(configure_routes),
        )
        .await;

        let create = |slug: &str| {
            test::TestRequest::post()
                .uri("/api/tags/")
                .insert_header(header.clone())
                .set_json(json!({"name": slug, "color": "#E26C2D", "slug": slug}))
                .to_request()
        };

        let mut demoted: users::ActiveModel = admin.into();
        demoted.is_staff = Set(false);
        let demoted = demoted.update(&db).await.unwrap();
        assert_eq!(test::call_service(&app, create("brunch")).await.status(), StatusCode::FORBIDDEN);

        let mut inactive: users::ActiveModel = demoted.into();
        inactive.is_staff = Set(true);
        inactive.is_active = Set(false);
        inactive.update(&db).await.unwrap();
        assert_eq!(test::call_service(&app, create("supper")).await.status(), StatusCode::UNAUTHORIZED);

        assert!(CatalogueService::tags(&db).await.unwrap().is_empty());
    }
}
