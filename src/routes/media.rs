use std::path::{Component, Path, PathBuf};

use actix_web::{get, web, HttpResponse};
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Resolve a request path below `root`, refusing anything that could escape it
fn resolve(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    if relative.as_os_str().is_empty() {
        return None;
    }
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(relative))
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// GET /media/{path} - Stored recipe images
#[get("/media/{path:.*}")]
pub async fn serve_media(
    path: web::Path<String>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let requested = path.into_inner();
    let Some(file) = resolve(&config.media_root, &requested) else {
        warn!(path = %requested, "rejected media path");
        return Err(AppError::not_found("File"));
    };

    match tokio::fs::read(&file).await {
        Ok(bytes) => Ok(HttpResponse::Ok().content_type(content_type(&file)).body(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::not_found("File")),
        Err(e) => Err(AppError::Internal(format!("failed to read {}: {}", file.display(), e))),
    }
}

pub fn media_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(serve_media);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::configure_routes;
    use crate::test_utils;
    use actix_web::http::StatusCode;
    use actix_web::middleware::NormalizePath;
    use actix_web::App;

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/media");
        assert_eq!(
            resolve(root, "recipes/images/a.png"),
            Some(PathBuf::from("/srv/media/recipes/images/a.png"))
        );
        assert!(resolve(root, "../etc/passwd").is_none());
        assert!(resolve(root, "recipes/../../secret").is_none());
        assert!(resolve(root, "/etc/passwd").is_none());
        assert!(resolve(root, "").is_none());
    }

    #[actix_web::test]
    async fn test_serves_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("recipes/images")).unwrap();
        std::fs::write(dir.path().join("recipes/images/dish.png"), b"png-bytes").unwrap();

        let db = test_utils::setup_db().await;
        let app = actix_web::test::init_service(
            App::new()
                .wrap(NormalizePath::trim())
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(test_utils::test_config_with_media(dir.path().to_path_buf())))
                .configure(configure_routes),
        )
        .await;

        let req = actix_web::test::TestRequest::get().uri("/media/recipes/images/dish.png").to_request();
        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), "image/png");
        assert_eq!(actix_web::test::read_body(resp).await.as_ref(), b"png-bytes");

        let req = actix_web::test::TestRequest::get().uri("/media/recipes/images/missing.png").to_request();
        assert_eq!(actix_web::test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
