use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::{Expr, Query};
use sea_orm::*;
use tracing::info;
use url::form_urlencoded;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::dto::{
    CreateRecipeRequest, IngredientAmount, RecipeIngredientResponse, RecipeResponse,
    ShortRecipeResponse, UpdateRecipeRequest, UserResponse,
};
use crate::models::{favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, users};
use crate::services::subscription_service::SubscriptionService;
use crate::utils::image::{self, DecodedImage};
use crate::utils::pagination::PageRequest;

/// Filters of `GET /recipes/`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeFilters {
    pub author: Option<i32>,
    /// Tag slugs; a recipe matches if it carries any of them
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilters {
    /// Parse the raw query string; `tags` may repeat
    pub fn from_query(query: &str) -> AppResult<Self> {
        let mut filters = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "author" if !value.is_empty() => {
                    let author = value
                        .parse()
                        .map_err(|_| field_error("author", "invalid", "Author must be a user id."))?;
                    filters.author = Some(author);
                }
                "tags" if !value.is_empty() => filters.tags.push(value.into_owned()),
                "is_favorited" => filters.is_favorited = is_truthy(&value),
                "is_in_shopping_cart" => filters.is_in_shopping_cart = is_truthy(&value),
                _ => {}
            }
        }
        Ok(filters)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

/// Single-field validation failure
fn field_error(field: &'static str, code: &'static str, message: &str) -> AppError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_string().into());
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

pub struct RecipeService;

impl RecipeService {
    pub async fn get(db: &DatabaseConnection, id: i32) -> AppResult<recipe::Model> {
        recipe::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))
    }

    /// Listing query: filters applied, newest first.
    /// Viewer-relative filters are ignored for anonymous viewers.
    pub fn filtered(filters: &RecipeFilters, viewer: Option<i32>) -> Select<recipe::Entity> {
        let mut query = recipe::Entity::find();

        if let Some(author) = filters.author {
            query = query.filter(recipe::Column::AuthorId.eq(author));
        }

        if !filters.tags.is_empty() {
            // subquery, so a recipe matching several slugs is listed once
            let tagged = Query::select()
                .column((recipe_tag::Entity, recipe_tag::Column::RecipeId))
                .from(recipe_tag::Entity)
                .inner_join(
                    tag::Entity,
                    Expr::col((tag::Entity, tag::Column::Id))
                        .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
                )
                .and_where(Expr::col((tag::Entity, tag::Column::Slug)).is_in(filters.tags.clone()))
                .to_owned();
            query = query.filter(recipe::Column::Id.in_subquery(tagged));
        }

        if let Some(viewer) = viewer {
            if filters.is_favorited {
                let favorites = Query::select()
                    .column((favorite::Entity, favorite::Column::RecipeId))
                    .from(favorite::Entity)
                    .and_where(favorite::Column::UserId.eq(viewer))
                    .to_owned();
                query = query.filter(recipe::Column::Id.in_subquery(favorites));
            }
            if filters.is_in_shopping_cart {
                let cart = Query::select()
                    .column((shopping_cart::Entity, shopping_cart::Column::RecipeId))
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(viewer))
                    .to_owned();
                query = query.filter(recipe::Column::Id.in_subquery(cart));
            }
        }

        query
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
    }

    /// One page of the read model, plus the total number of matches
    pub async fn list(
        db: &DatabaseConnection,
        config: &AppConfig,
        filters: &RecipeFilters,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(u64, Vec<RecipeResponse>)> {
        let paginator = Self::filtered(filters, viewer).paginate(db, page.per_page);
        let count = paginator.num_items().await?;
        page.check_in_range(count)?;

        let recipes = paginator.fetch_page(page.index()).await?;
        let rendered = Self::render_many(db, config, recipes, viewer).await?;
        Ok((count, rendered))
    }

    pub async fn render(
        db: &DatabaseConnection,
        config: &AppConfig,
        recipe: recipe::Model,
        viewer: Option<i32>,
    ) -> AppResult<RecipeResponse> {
        Self::render_many(db, config, vec![recipe], viewer)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("recipe rendering produced no output".to_string()))
    }

    /// Build read models for a batch of recipes with a fixed number of queries
    pub async fn render_many(
        db: &DatabaseConnection,
        config: &AppConfig,
        recipes: Vec<recipe::Model>,
        viewer: Option<i32>,
    ) -> AppResult<Vec<RecipeResponse>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let author_ids: Vec<i32> = recipes
            .iter()
            .map(|r| r.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // 1. Authors
        let authors: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        // 2. Tags per recipe
        let mut tags: HashMap<i32, Vec<tag::Model>> = HashMap::new();
        let tag_rows = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(recipe_tag::Column::Id)
            .find_also_related(tag::Entity)
            .all(db)
            .await?;
        for (link, tag) in tag_rows {
            if let Some(tag) = tag {
                tags.entry(link.recipe_id).or_default().push(tag);
            }
        }

        // 3. Ingredients per recipe, flattened with their amounts
        let mut ingredients: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
        let ingredient_rows = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(recipe_ingredient::Column::Id)
            .find_also_related(ingredient::Entity)
            .all(db)
            .await?;
        for (link, ingredient) in ingredient_rows {
            if let Some(ingredient) = ingredient {
                ingredients.entry(link.recipe_id).or_default().push(RecipeIngredientResponse {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: link.amount,
                });
            }
        }

        // 4. Viewer-relative flags; anonymous viewers get empty sets
        let (favorited, in_cart, subscribed) = match viewer {
            Some(viewer) => (
                Self::favorited_ids(db, viewer, &recipe_ids).await?,
                Self::carted_ids(db, viewer, &recipe_ids).await?,
                SubscriptionService::subscribed_authors(db, viewer, &author_ids).await?,
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("author {} of recipe {} missing", recipe.author_id, recipe.id))
                })?;
                let is_subscribed = subscribed.contains(&author.id);
                Ok(RecipeResponse {
                    id: recipe.id,
                    tags: tags.remove(&recipe.id).unwrap_or_default(),
                    author: UserResponse::new(author, is_subscribed),
                    ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    image: recipe.image.as_deref().map(|path| config.media_link(path)),
                    name: recipe.name,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    pub fn short(config: &AppConfig, recipe: &recipe::Model) -> ShortRecipeResponse {
        ShortRecipeResponse {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.as_deref().map(|path| config.media_link(path)),
            cooking_time: recipe.cooking_time,
        }
    }

    async fn favorited_ids(db: &DatabaseConnection, user_id: i32, recipe_ids: &[i32]) -> AppResult<HashSet<i32>> {
        let rows = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|f| f.recipe_id).collect())
    }

    async fn carted_ids(db: &DatabaseConnection, user_id: i32, recipe_ids: &[i32]) -> AppResult<HashSet<i32>> {
        let rows = shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|c| c.recipe_id).collect())
    }

    /// Create a recipe with its ingredient and tag links in one transaction
    pub async fn create(
        db: &DatabaseConnection,
        config: &AppConfig,
        author_id: i32,
        request: CreateRecipeRequest,
    ) -> AppResult<recipe::Model> {
        request.validate()?;
        Self::check_ingredients(db, &request.ingredients).await?;
        Self::check_tags(db, &request.tags).await?;
        let image = Self::save_image(config, request.image.as_deref()).await?;

        match Self::insert_recipe(db, author_id, image.clone(), request).await {
            Ok(recipe) => {
                info!(recipe_id = recipe.id, author_id, "recipe created");
                Ok(recipe)
            }
            Err(e) => {
                if let Some(path) = &image {
                    image::remove(&config.media_root, path).await;
                }
                Err(e)
            }
        }
    }

    async fn insert_recipe(
        db: &DatabaseConnection,
        author_id: i32,
        image: Option<String>,
        request: CreateRecipeRequest,
    ) -> AppResult<recipe::Model> {
        let txn = db.begin().await?;

        let recipe = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(request.name),
            image: Set(image),
            text: Set(request.text),
            cooking_time: Set(request.cooking_time),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Self::insert_ingredients(&txn, recipe.id, &request.ingredients).await?;
        Self::insert_tags(&txn, recipe.id, &request.tags).await?;

        txn.commit().await?;
        Ok(recipe)
    }

    /// Apply a partial update. A supplied ingredient or tag list replaces
    /// the previous links entirely.
    pub async fn update(
        db: &DatabaseConnection,
        config: &AppConfig,
        recipe: recipe::Model,
        request: UpdateRecipeRequest,
    ) -> AppResult<recipe::Model> {
        request.validate()?;
        if let Some(ingredients) = &request.ingredients {
            Self::check_ingredients(db, ingredients).await?;
        }
        if let Some(tags) = &request.tags {
            Self::check_tags(db, tags).await?;
        }
        let image = Self::save_image(config, request.image.as_deref()).await?;
        let previous_image = recipe.image.clone();

        match Self::apply_update(db, recipe, image.clone(), request).await {
            Ok(updated) => {
                // The replaced file is no longer referenced
                if let (Some(_), Some(old)) = (&image, &previous_image) {
                    image::remove(&config.media_root, old).await;
                }
                info!(recipe_id = updated.id, "recipe updated");
                Ok(updated)
            }
            Err(e) => {
                if let Some(path) = &image {
                    image::remove(&config.media_root, path).await;
                }
                Err(e)
            }
        }
    }

    async fn apply_update(
        db: &DatabaseConnection,
        recipe: recipe::Model,
        image: Option<String>,
        request: UpdateRecipeRequest,
    ) -> AppResult<recipe::Model> {
        let txn = db.begin().await?;

        let mut active: recipe::ActiveModel = recipe.clone().into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(text) = request.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = request.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if image.is_some() {
            active.image = Set(image);
        }
        let updated = if active.is_changed() {
            active.update(&txn).await?
        } else {
            recipe
        };

        if let Some(ingredients) = &request.ingredients {
            recipe_ingredient::Entity::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(updated.id))
                .exec(&txn)
                .await?;
            Self::insert_ingredients(&txn, updated.id, ingredients).await?;
        }

        if let Some(tags) = &request.tags {
            recipe_tag::Entity::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(updated.id))
                .exec(&txn)
                .await?;
            Self::insert_tags(&txn, updated.id, tags).await?;
        }

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(db: &DatabaseConnection, config: &AppConfig, recipe: recipe::Model) -> AppResult<()> {
        let id = recipe.id;
        let stored_image = recipe.image.clone();
        recipe.delete(db).await?;
        if let Some(path) = &stored_image {
            image::remove(&config.media_root, path).await;
        }
        info!(recipe_id = id, "recipe deleted");
        Ok(())
    }

    async fn save_image(config: &AppConfig, data: Option<&str>) -> AppResult<Option<String>> {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return Ok(None);
        };
        let decoded: DecodedImage =
            image::decode_data_uri(data).map_err(|e| field_error("image", "invalid", &e))?;
        let path = decoded
            .store(&config.media_root)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store image: {}", e)))?;
        Ok(Some(path))
    }

    /// Non-empty, no duplicates, positive amounts, every ingredient exists
    async fn check_ingredients(db: &DatabaseConnection, items: &[IngredientAmount]) -> AppResult<()> {
        if items.is_empty() {
            return Err(field_error("ingredients", "empty", "Add at least one ingredient."));
        }
        for item in items {
            if item.validate().is_err() {
                return Err(field_error("ingredients", "amount", "Amount must be at least 1."));
            }
        }

        let ids: HashSet<i32> = items.iter().map(|i| i.id).collect();
        if ids.len() != items.len() {
            return Err(field_error("ingredients", "duplicate", "Ingredients must not repeat."));
        }

        let found = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ids.iter().copied()))
            .count(db)
            .await?;
        if found != ids.len() as u64 {
            return Err(field_error("ingredients", "does_not_exist", "Unknown ingredient id."));
        }
        Ok(())
    }

    /// Non-empty, no duplicates, every tag exists
    async fn check_tags(db: &DatabaseConnection, tag_ids: &[i32]) -> AppResult<()> {
        if tag_ids.is_empty() {
            return Err(field_error("tags", "empty", "Add at least one tag."));
        }

        let ids: HashSet<i32> = tag_ids.iter().copied().collect();
        if ids.len() != tag_ids.len() {
            return Err(field_error("tags", "duplicate", "Tags must not repeat."));
        }

        let found = tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .count(db)
            .await?;
        if found != ids.len() as u64 {
            return Err(field_error("tags", "does_not_exist", "Unknown tag id."));
        }
        Ok(())
    }

    async fn insert_ingredients<C: ConnectionTrait>(
        conn: &C,
        recipe_id: i32,
        items: &[IngredientAmount],
    ) -> Result<(), DbErr> {
        if items.is_empty() {
            return Ok(());
        }
        let rows = items.iter().map(|item| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(item.amount),
            ..Default::default()
        });
        recipe_ingredient::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    async fn insert_tags<C: ConnectionTrait>(conn: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        let rows = tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
            ..Default::default()
        });
        recipe_tag::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }
}
