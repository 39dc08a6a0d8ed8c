// Database connection and schema bootstrap

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::info;

use crate::config::AppConfig;
use crate::models::{
    favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, subscription,
    tag, users,
};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Create every missing table and the composite unique indexes.
/// Tables are created in foreign key order.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, tag::Entity).await?;
    create_table(db, ingredient::Entity).await?;
    create_table(db, recipe::Entity).await?;
    create_table(db, recipe_ingredient::Entity).await?;
    create_table(db, recipe_tag::Entity).await?;
    create_table(db, favorite::Entity).await?;
    create_table(db, shopping_cart::Entity).await?;
    create_table(db, subscription::Entity).await?;

    let backend = db.get_database_backend();
    for index in unique_indexes() {
        db.execute(backend.build(&index)).await?;
    }

    info!("Database schema ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("unique_ingredient")
            .table(ingredient::Entity)
            .col(ingredient::Column::Name)
            .col(ingredient::Column::MeasurementUnit)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("recipe_ingredient_unique")
            .table(recipe_ingredient::Entity)
            .col(recipe_ingredient::Column::RecipeId)
            .col(recipe_ingredient::Column::IngredientId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("recipe_tag_unique")
            .table(recipe_tag::Entity)
            .col(recipe_tag::Column::RecipeId)
            .col(recipe_tag::Column::TagId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("unique_favorite_user_recipe")
            .table(favorite::Entity)
            .col(favorite::Column::UserId)
            .col(favorite::Column::RecipeId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("unique_shopping_cart_user_recipe")
            .table(shopping_cart::Entity)
            .col(shopping_cart::Column::UserId)
            .col(shopping_cart::Column::RecipeId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("unique_subscription_author_user")
            .table(subscription::Entity)
            .col(subscription::Column::AuthorId)
            .col(subscription::Column::UserId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}
