//! Page-number pagination: `?page=N&limit=M` in, `{count, next, previous, results}` out.

use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::errors::AppError;

pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Validated page number (1-based) and page size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageQuery {
    pub fn resolve(&self, default_size: u64) -> Result<PageRequest, AppError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(invalid_page());
        }
        let per_page = self.limit.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        Ok(PageRequest { page, per_page })
    }
}

impl PageRequest {
    /// Zero-based index for sea-orm's `Paginator::fetch_page`
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    /// Reject pages past the end; page 1 of an empty list is fine
    pub fn check_in_range(&self, count: u64) -> Result<(), AppError> {
        if self.page > 1 && (self.page - 1) * self.per_page >= count {
            return Err(invalid_page());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: &HttpRequest, request: PageRequest, count: u64, results: Vec<T>) -> Self {
        let has_next = request.page * request.per_page < count;
        Self {
            count,
            next: has_next.then(|| page_link(req, request.page + 1)),
            previous: (request.page > 1).then(|| page_link(req, request.page - 1)),
            results,
        }
    }
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".to_string())
}

/// Absolute URL of the current request with `page` swapped out.
/// Page 1 is linked without a `page` parameter.
fn page_link(req: &HttpRequest, page: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(req.query_string().as_bytes()) {
        if key != "page" {
            query.append_pair(&key, &value);
        }
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    let info = req.connection_info();
    let base = format!("{}://{}{}", info.scheme(), info.host(), req.path());
    if query.is_empty() {
        base
    } else {
        format!("{}?{}", base, query)
    }
}
