use common::MoveStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    /// Barcodes come from the seller and are globally unique.
    #[sea_orm(primary_key, auto_increment = false)]
    pub barcode: String,

    pub name: String,
    pub seller: Option<String>,

    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: BelongsTo<Option<super::category::Entity>>,

    pub move_status: MoveStatus,

    /// Set by the priority sweep for products past the income-age threshold.
    pub priority: bool,
    /// Cross-module flag: the product must not be rendered while its retouch
    /// is unfinished. Maintained by the render-block sweep.
    pub blocked_for_render: bool,

    pub info: Option<String>,

    pub income_at: Option<DateTimeUtc>,
    pub income_user_id: Option<i32>,
    pub outcome_at: Option<DateTimeUtc>,
    pub outcome_user_id: Option<i32>,

    #[sea_orm(has_many)]
    pub operations: HasMany<super::product_operation::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
