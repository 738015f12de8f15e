use common::OrderStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_order")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Sequential human-facing number. Allocated max+1 under a unique index
    /// with a retry-on-conflict loop.
    #[sea_orm(unique)]
    pub order_number: i32,

    pub status: OrderStatus,

    pub creator_id: i32,
    #[sea_orm(belongs_to, from = "creator_id", to = "id")]
    pub creator: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub assembly_started_at: Option<DateTimeUtc>,
    pub accept_finished_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub products: HasMany<super::order_product::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
