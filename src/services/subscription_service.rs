use std::collections::HashSet;

use sea_orm::sea_query::Query;
use sea_orm::*;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::dto::{SubscribedAuthorResponse, UserResponse};
use crate::models::{recipe, subscription, users};
use crate::services::recipe_service::RecipeService;
use crate::services::user_service::UserService;
use crate::utils::pagination::PageRequest;

pub struct SubscriptionService;

impl SubscriptionService {
    pub async fn is_subscribed<C: ConnectionTrait>(conn: &C, user_id: i32, author_id: i32) -> Result<bool, DbErr> {
        let count = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Which of `author_ids` the user follows
    pub async fn subscribed_authors(
        db: &DatabaseConnection,
        user_id: i32,
        author_ids: &[i32],
    ) -> Result<HashSet<i32>, DbErr> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let followed: Vec<i32> = subscription::Entity::find()
            .select_only()
            .column(subscription::Column::AuthorId)
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.is_in(author_ids.to_vec()))
            .into_tuple()
            .all(db)
            .await?;
        Ok(followed.into_iter().collect())
    }

    pub async fn subscribe(db: &DatabaseConnection, user_id: i32, author_id: i32) -> AppResult<users::Model> {
        let author = UserService::get(db, author_id).await?;

        if author.id == user_id {
            return Err(AppError::BadRequest("You cannot subscribe to yourself.".to_string()));
        }
        if Self::is_subscribed(db, user_id, author.id).await? {
            return Err(AppError::BadRequest("You are already subscribed to this author.".to_string()));
        }

        subscription::ActiveModel {
            author_id: Set(author.id),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(user_id, author_id, "subscribed");
        Ok(author)
    }

    pub async fn unsubscribe(db: &DatabaseConnection, user_id: i32, author_id: i32) -> AppResult<()> {
        let author = UserService::get(db, author_id).await?;

        let deleted = subscription::Entity::delete_many()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.eq(author.id))
            .exec(db)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(AppError::BadRequest("You are not subscribed to this author.".to_string()));
        }

        info!(user_id, author_id, "unsubscribed");
        Ok(())
    }

    /// Authors the user follows, ordered by id
    pub async fn list(
        db: &DatabaseConnection,
        config: &AppConfig,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> AppResult<(u64, Vec<SubscribedAuthorResponse>)> {
        let followed = Query::select()
            .column(subscription::Column::AuthorId)
            .from(subscription::Entity)
            .and_where(subscription::Column::UserId.eq(user_id))
            .to_owned();

        let paginator = users::Entity::find()
            .filter(users::Column::Id.in_subquery(followed))
            .order_by_asc(users::Column::Id)
            .paginate(db, page.per_page);
        let count = paginator.num_items().await?;
        page.check_in_range(count)?;

        let mut results = Vec::new();
        for author in paginator.fetch_page(page.index()).await? {
            results.push(Self::enrich(db, config, author, true, recipes_limit).await?);
        }
        Ok((count, results))
    }

    /// Author profile plus recipe count and newest recipes
    pub async fn enrich(
        db: &DatabaseConnection,
        config: &AppConfig,
        author: users::Model,
        is_subscribed: bool,
        recipes_limit: Option<u64>,
    ) -> AppResult<SubscribedAuthorResponse> {
        let by_author = recipe::Entity::find().filter(recipe::Column::AuthorId.eq(author.id));
        let recipes_count = by_author.clone().count(db).await?;

        let recipes = by_author
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .limit(recipes_limit)
            .all(db)
            .await?
            .iter()
            .map(|r| RecipeService::short(config, r))
            .collect();

        Ok(SubscribedAuthorResponse {
            user: UserResponse::new(author, is_subscribed),
            recipes_count,
            recipes,
        })
    }
}
