use common::OperationType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit trail. Rows are only ever inserted.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_operation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub barcode: String,
    #[sea_orm(belongs_to, from = "barcode", to = "barcode")]
    pub product: HasOne<super::product::Entity>,

    pub operation_type: OperationType,

    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
