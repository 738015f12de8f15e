use common::{PhotoStatus, SeniorPhotoStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shooting_request_product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub request_id: i32,
    #[sea_orm(belongs_to, from = "request_id", to = "id")]
    pub request: HasOne<super::shooting_request::Entity>,

    pub barcode: String,
    #[sea_orm(belongs_to, from = "barcode", to = "barcode")]
    pub product: HasOne<super::product::Entity>,

    pub photo_status: PhotoStatus,
    pub senior_photo_status: SeniorPhotoStatus,

    pub shooting_started_at: Option<DateTimeUtc>,
    pub shooting_ended_at: Option<DateTimeUtc>,

    /// Remote folder with the source shots, set by the photographer when
    /// finishing a session. Consumed by the archive builder.
    pub photo_folder: Option<String>,

    /// Mutual exclusion: a product may sit in at most one active retouch
    /// request. Checked FOR UPDATE inside the assignment transaction.
    pub on_retouch: bool,

    #[sea_orm(has_many)]
    pub retouch_products: HasMany<super::retouch_request_product::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
