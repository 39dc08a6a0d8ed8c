//! Application error type and its HTTP rendering.
//!
//! Every handler returns `Result<HttpResponse, AppError>`. Validation problems
//! render as a field map, business-rule failures as `{"errors": "..."}` and
//! everything else as `{"detail": "..."}`.

use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    /// Field-level validation failure (400)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Duplicate relation, missing relation, empty cart, bad credentials (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("You do not have permission to perform this action.")]
    Forbidden,

    /// Unknown entity (404)
    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{resource} not found."))
    }

    pub fn auth_required() -> Self {
        Self::Unauthorized("Authentication credentials were not provided.".to_string())
    }

    /// Flatten validator output to `{"field": ["message", ...]}`
    fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
        errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value ({}).", e.code))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        // A concurrent writer can slip past the existence checks; the unique
        // indexes still reject the row.
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                Self::BadRequest("This entry already exists.".to_string())
            }
            _ => Self::Database(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Validation(errors) => {
                HttpResponse::build(status).json(Self::field_messages(errors))
            }
            AppError::BadRequest(message) => {
                HttpResponse::build(status).json(json!({ "errors": message }))
            }
            AppError::Database(_) | AppError::Internal(_) => {
                error!(error = %self, "request failed");
                HttpResponse::build(status).json(json!({ "detail": "Internal server error." }))
            }
            _ => HttpResponse::build(status).json(json!({ "detail": self.to_string() })),
        }
    }
}
