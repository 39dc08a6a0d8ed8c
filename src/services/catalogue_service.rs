use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use tracing::info;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::dto::{CreateIngredientRequest, CreateTagRequest};
use crate::models::{ingredient, tag};

/// Tags and ingredients: small, staff-curated, read by everyone.
pub struct CatalogueService;

impl CatalogueService {
    pub async fn tags(db: &DatabaseConnection) -> AppResult<Vec<tag::Model>> {
        Ok(tag::Entity::find().order_by_asc(tag::Column::Name).all(db).await?)
    }

    pub async fn tag(db: &DatabaseConnection, id: i32) -> AppResult<tag::Model> {
        tag::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Tag"))
    }

    pub async fn create_tag(db: &DatabaseConnection, request: CreateTagRequest) -> AppResult<tag::Model> {
        request.validate()?;

        let taken = tag::Entity::find()
            .filter(
                Condition::any()
                    .add(tag::Column::Name.eq(&request.name))
                    .add(tag::Column::Slug.eq(&request.slug)),
            )
            .count(db)
            .await?
            > 0;
        if taken {
            return Err(AppError::BadRequest("A tag with this name or slug already exists.".to_string()));
        }

        let tag = tag::ActiveModel {
            name: Set(request.name),
            color: Set(request.color.to_uppercase()),
            slug: Set(request.slug),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(tag_id = tag.id, slug = %tag.slug, "tag created");
        Ok(tag)
    }

    /// Ingredients ordered by name, optionally narrowed to a
    /// case-insensitive name prefix
    pub async fn ingredients(db: &DatabaseConnection, prefix: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        let mut query = ingredient::Entity::find();

        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((ingredient::Entity, ingredient::Column::Name))))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }

        Ok(query
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn ingredient(db: &DatabaseConnection, id: i32) -> AppResult<ingredient::Model> {
        ingredient::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))
    }

    pub async fn create_ingredient(
        db: &DatabaseConnection,
        request: CreateIngredientRequest,
    ) -> AppResult<ingredient::Model> {
        request.validate()?;

        let taken = ingredient::Entity::find()
            .filter(ingredient::Column::Name.eq(&request.name))
            .filter(ingredient::Column::MeasurementUnit.eq(&request.measurement_unit))
            .count(db)
            .await?
            > 0;
        if taken {
            return Err(AppError::BadRequest("This ingredient already exists.".to_string()));
        }

        let ingredient = ingredient::ActiveModel {
            name: Set(request.name),
            measurement_unit: Set(request.measurement_unit),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(ingredient_id = ingredient.id, "ingredient created");
        Ok(ingredient)
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
