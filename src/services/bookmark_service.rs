use sea_orm::*;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::{favorite, recipe, shopping_cart};
use crate::services::recipe_service::RecipeService;

/// The two per-user recipe lists. They share one lifecycle: add once,
/// remove if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bookmark {
    Favorite,
    ShoppingCart,
}

impl Bookmark {
    fn label(self) -> &'static str {
        match self {
            Bookmark::Favorite => "favorites",
            Bookmark::ShoppingCart => "shopping cart",
        }
    }

    pub async fn exists<C: ConnectionTrait>(self, conn: &C, user_id: i32, recipe_id: i32) -> Result<bool, DbErr> {
        let count = match self {
            Bookmark::Favorite => {
                favorite::Entity::find()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .count(conn)
                    .await?
            }
            Bookmark::ShoppingCart => {
                shopping_cart::Entity::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .count(conn)
                    .await?
            }
        };
        Ok(count > 0)
    }

    /// Returns the recipe so the caller can render its short form
    pub async fn add(self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> AppResult<recipe::Model> {
        let recipe = RecipeService::get(db, recipe_id).await?;

        if self.exists(db, user_id, recipe_id).await? {
            return Err(AppError::BadRequest(format!("Recipe is already in {}.", self.label())));
        }

        match self {
            Bookmark::Favorite => {
                favorite::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
            Bookmark::ShoppingCart => {
                shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }

        info!(user_id, recipe_id, list = self.label(), "recipe bookmarked");
        Ok(recipe)
    }

    pub async fn remove(self, db: &DatabaseConnection, user_id: i32, recipe_id: i32) -> AppResult<()> {
        RecipeService::get(db, recipe_id).await?;

        let deleted = match self {
            Bookmark::Favorite => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(db)
                    .await?
            }
            Bookmark::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(db)
                    .await?
            }
        };

        if deleted.rows_affected == 0 {
            return Err(AppError::BadRequest(format!("Recipe is not in {}.", self.label())));
        }

        info!(user_id, recipe_id, list = self.label(), "recipe unbookmarked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[actix_web::test]
    async fn test_add_then_duplicate() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;
        let recipe = test_utils::create_recipe(&db, user.id, "Soup", &[], &[]).await;

        for bookmark in [Bookmark::Favorite, Bookmark::ShoppingCart] {
            let added = bookmark.add(&db, user.id, recipe.id).await.unwrap();
            assert_eq!(added.id, recipe.id);
            assert!(bookmark.exists(&db, user.id, recipe.id).await.unwrap());

            let again = bookmark.add(&db, user.id, recipe.id).await;
            assert!(matches!(again, Err(AppError::BadRequest(_))));
        }
    }

    #[actix_web::test]
    async fn test_lists_are_independent() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;
        let recipe = test_utils::create_recipe(&db, user.id, "Soup", &[], &[]).await;

        Bookmark::Favorite.add(&db, user.id, recipe.id).await.unwrap();
        assert!(!Bookmark::ShoppingCart.exists(&db, user.id, recipe.id).await.unwrap());
    }

    #[actix_web::test]
    async fn test_remove() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;
        let recipe = test_utils::create_recipe(&db, user.id, "Soup", &[], &[]).await;

        let missing = Bookmark::Favorite.remove(&db, user.id, recipe.id).await;
        assert!(matches!(missing, Err(AppError::BadRequest(_))));

        Bookmark::Favorite.add(&db, user.id, recipe.id).await.unwrap();
        Bookmark::Favorite.remove(&db, user.id, recipe.id).await.unwrap();
        assert!(!Bookmark::Favorite.exists(&db, user.id, recipe.id).await.unwrap());
    }

    #[actix_web::test]
    async fn test_unknown_recipe_is_not_found() {
        let db = test_utils::setup_db().await;
        let user = test_utils::create_user(&db, "anna", false).await;

        let added = Bookmark::ShoppingCart.add(&db, user.id, 404).await;
        assert!(matches!(added, Err(AppError::NotFound(_))));
        let removed = Bookmark::ShoppingCart.remove(&db, user.id, 404).await;
        assert!(matches!(removed, Err(AppError::NotFound(_))));
    }
}
