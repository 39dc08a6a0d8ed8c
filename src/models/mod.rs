// ============================================================================
// MODELS
// ============================================================================
//
// One sea-orm entity per table, plus the API DTOs.
//
//   - users : accounts (email login, staff flag)
//   - subscription : follower relation between users
//   - tag : recipe tags (name, color, slug)
//   - ingredient : ingredient catalogue
//   - recipe : recipes, authored by a user
//   - recipe_ingredient : recipe <-> ingredient with amount
//   - recipe_tag : recipe <-> tag
//   - favorite : user <-> recipe bookmarks
//   - shopping_cart : user <-> recipe purchase queue
//   - dto : request/response bodies
//   - health : health check response
//
// Composite unique constraints live in db::create_schema, not here.
//
// ============================================================================

pub mod health;
pub mod users;
pub mod subscription;
pub mod tag;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod favorite;
pub mod shopping_cart;
pub mod dto;
