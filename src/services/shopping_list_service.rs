use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::{ingredient, recipe_ingredient, shopping_cart};

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// One aggregated line of the shopping list
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

pub struct ShoppingListService;

impl ShoppingListService {
    /// Sum ingredient amounts over every recipe in the user's cart,
    /// grouped by (name, unit) and sorted by name.
    pub async fn aggregate(db: &DatabaseConnection, user_id: i32) -> AppResult<Vec<ShoppingListItem>> {
        let recipe_ids: Vec<i32> = shopping_cart::Entity::find()
            .select_only()
            .column(shopping_cart::Column::RecipeId)
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .into_tuple()
            .all(db)
            .await?;

        if recipe_ids.is_empty() {
            return Err(AppError::BadRequest("Shopping cart is empty.".to_string()));
        }

        let items = recipe_ingredient::Entity::find()
            .select_only()
            .column_as(ingredient::Column::Name, "name")
            .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
            .column_as(
                Expr::col((recipe_ingredient::Entity, recipe_ingredient::Column::Amount)).sum(),
                "total",
            )
            .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .group_by(ingredient::Column::Name)
            .group_by(ingredient::Column::MeasurementUnit)
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::MeasurementUnit)
            .into_model::<ShoppingListItem>()
            .all(db)
            .await?;

        Ok(items)
    }

    pub fn render(items: &[ShoppingListItem]) -> String {
        let lines: Vec<String> = items
            .iter()
            .map(|item| format!("{} — {} ({})", item.name, item.total, item.measurement_unit))
            .collect();
        format!("Shopping list:\n\n{}\n\nFoodgram.", lines.join("\n"))
    }
}
