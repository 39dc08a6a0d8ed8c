// Fixtures shared by the unit and handler tests.

use std::path::PathBuf;

use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::config::AppConfig;
use crate::db;
use crate::models::{favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, users};
use crate::utils::{jwt, password};

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_ttl_hours: 1,
        host: "127.0.0.1".to_string(),
        port: 8080,
        media_root: std::env::temp_dir().join("foodgram-test-media"),
        media_url: "/media/".to_string(),
        page_size: 6,
    }
}

pub fn test_config_with_media(media_root: PathBuf) -> AppConfig {
    AppConfig {
        media_root,
        ..test_config()
    }
}

/// A user that is never persisted, for token tests
pub fn user_model(id: i32, username: &str, is_staff: bool) -> users::Model {
    users::Model {
        id,
        email: format!("{username}@example.com"),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password_hash: String::new(),
        is_staff,
        is_active: true,
    }
}

/// Fresh in-memory database with the full schema.
/// One connection, so every query sees the same memory database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    db::create_schema(&db).await.unwrap();
    db
}

/// Persist an active user whose password is `TEST_PASSWORD`
pub async fn create_user(db: &DatabaseConnection, username: &str, is_staff: bool) -> users::Model {
    // low iteration count keeps the tests fast; verification reads it from the hash
    let password_hash = password::hash_password_with(TEST_PASSWORD, 1_000).unwrap();
    users::ActiveModel {
        email: Set(format!("{username}@example.com")),
        username: Set(username.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        password_hash: Set(password_hash),
        is_staff: Set(is_staff),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// `Authorization` header value for a user
pub fn auth_header(user: &users::Model) -> (&'static str, String) {
    let token = jwt::generate_token(&test_config(), user).unwrap();
    ("Authorization", format!("Token {token}"))
}

pub async fn create_tag(db: &DatabaseConnection, slug: &str) -> tag::Model {
    tag::ActiveModel {
        name: Set(slug.to_uppercase()),
        color: Set("#49B64E".to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_ingredient(db: &DatabaseConnection, name: &str, unit: &str) -> ingredient::Model {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(unit.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Insert a recipe with `(ingredient_id, amount)` links and tag links
pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> recipe::Model {
    let recipe = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_string()),
        image: Set(None),
        text: Set(format!("How to cook {name}.")),
        cooking_time: Set(30),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    for &(ingredient_id, amount) in ingredients {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    for &tag_id in tags {
        recipe_tag::ActiveModel {
            recipe_id: Set(recipe.id),
            tag_id: Set(tag_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    recipe
}

pub async fn add_favorite(db: &DatabaseConnection, user_id: i32, recipe_id: i32) {
    favorite::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn add_to_cart(db: &DatabaseConnection, user_id: i32, recipe_id: i32) {
    shopping_cart::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}
