pub mod auth;
pub mod permissions;

pub use auth::{AuthUser, MaybeAuthUser};
pub use permissions::Policy;
