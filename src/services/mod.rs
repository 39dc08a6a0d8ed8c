pub mod bookmark_service;
pub mod catalogue_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod subscription_service;
pub mod user_service;
