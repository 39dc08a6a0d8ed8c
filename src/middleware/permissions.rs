//! Row-level authorization policies.
//!
//! Every policy lets safe (read-only) methods through for anyone. For
//! mutations the requester must already be authenticated; the handler
//! returns 401 before a policy is consulted.

use actix_web::http::Method;

use crate::errors::AppError;
use crate::middleware::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Mutation only by the object's owner
    OwnerOrReadOnly,
    /// Mutation only by staff
    AdminOrReadOnly,
    /// Mutation by the author or any staff user
    AuthorOrAdminOrReadOnly,
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl Policy {
    /// `owner_id` is the author/owner of the target object, if it has one
    pub fn allows(self, method: &Method, requester: Option<&AuthUser>, owner_id: Option<i32>) -> bool {
        if is_safe_method(method) {
            return true;
        }
        let Some(user) = requester else {
            return false;
        };
        let is_owner = owner_id == Some(user.user_id);
        match self {
            Policy::OwnerOrReadOnly => is_owner,
            Policy::AdminOrReadOnly => user.is_staff,
            Policy::AuthorOrAdminOrReadOnly => is_owner || user.is_staff,
        }
    }

    pub fn enforce(self, method: &Method, requester: &AuthUser, owner_id: Option<i32>) -> Result<(), AppError> {
        if self.allows(method, Some(requester), owner_id) {
            Ok(())
        } else {
            tracing::warn!(policy = ?self, user_id = requester.user_id, %method, "permission denied");
            Err(AppError::Forbidden)
        }
    }
}
