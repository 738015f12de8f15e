use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub order_id: i32,
    #[sea_orm(belongs_to, from = "order_id", to = "id")]
    pub order: HasOne<super::customer_order::Entity>,

    pub barcode: String,
    #[sea_orm(belongs_to, from = "barcode", to = "barcode")]
    pub product: HasOne<super::product::Entity>,

    pub accepted: bool,
    pub accepted_at: Option<DateTimeUtc>,
    pub accepted_by: Option<i32>,
}

impl ActiveModelBehavior for ActiveModel {}
