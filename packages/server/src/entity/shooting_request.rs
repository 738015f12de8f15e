use common::ShootingRequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shooting_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub request_number: i32,

    pub status: ShootingRequestStatus,

    /// Derived from the majority vote over member categories; see
    /// `utils::request_type`.
    pub request_type: Option<i32>,
    /// While set, automatic recomputation of `request_type` is disabled.
    pub type_locked: bool,

    pub photographer_id: Option<i32>,
    #[sea_orm(belongs_to, from = "photographer_id", to = "id")]
    pub photographer: BelongsTo<Option<super::user::Entity>>,

    pub created_at: DateTimeUtc,
    pub photo_at: Option<DateTimeUtc>,
    pub checked_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub products: HasMany<super::shooting_request_product::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
