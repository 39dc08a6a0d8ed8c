// ============================================================================
// MODEL: RECIPE
// ============================================================================
//
// Columns:
//   - id (SERIAL, PRIMARY KEY)
//   - author_id (INTEGER, NOT NULL, FK users, ON DELETE CASCADE)
//   - name (VARCHAR(200))
//   - image (VARCHAR, NULL) - path relative to MEDIA_ROOT
//   - text (TEXT)
//   - cooking_time (INTEGER) - minutes, 1..=1000
//   - pub_date (TIMESTAMP, set on insert)
//
// Ingredients and tags are many-to-many through recipe_ingredient and
// recipe_tag. Listing order is pub_date DESC, id DESC.
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub author_id: i32,

    pub name: String,

    pub image: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub cooking_time: i32,

    pub pub_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,

    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTag,

    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorite,

    #[sea_orm(has_many = "super::shopping_cart::Entity")]
    ShoppingCart,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredient.def()
    }
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTag.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorite.def()
    }
}

impl Related<super::shopping_cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShoppingCart.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.pub_date.is_not_set() {
            self.pub_date = Set(Utc::now());
        }
        Ok(self)
    }
}
