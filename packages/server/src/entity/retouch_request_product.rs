use common::{RetouchStatus, SeniorRetouchStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retouch_request_product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub retouch_request_id: i32,
    #[sea_orm(belongs_to, from = "retouch_request_id", to = "id")]
    pub retouch_request: HasOne<super::retouch_request::Entity>,

    /// The shooting line this retouch line was created from. The photo
    /// folder and barcode are resolved through it.
    pub st_product_id: i32,
    #[sea_orm(belongs_to, from = "st_product_id", to = "id")]
    pub shooting_product: HasOne<super::shooting_request_product::Entity>,

    pub retouch_status: RetouchStatus,
    pub senior_retouch_status: Option<SeniorRetouchStatus>,

    pub retouch_link: Option<String>,
    pub comment: Option<String>,
    pub checked_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
