// ============================================================================
// MODEL: SUBSCRIPTION
// ============================================================================
//
// Follower relation between two users.
//
//   - user_id   : the subscriber
//   - author_id : the followed author
//   - date_added: set on insert
//
// Constraints:
//   - (author_id, user_id) is unique (index created in db::create_schema)
//   - author_id != user_id, checked by SubscriptionService before insert
//   - ON DELETE CASCADE on both foreign keys
//
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub author_id: i32,

    pub user_id: i32,

    pub date_added: DateTimeUtc,
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

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Subscriber,
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.date_added.is_not_set() {
            self.date_added = Set(Utc::now());
        }
        Ok(self)
    }
}
