use common::RetouchRequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retouch_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub request_number: i32,

    pub status: RetouchRequestStatus,

    pub retoucher_id: i32,
    #[sea_orm(belongs_to, from = "retoucher_id", to = "id")]
    pub retoucher: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,

    /// Archive-build state machine: no task recorded -> task running
    /// (task id + start stamped) -> completed | error.
    pub archive_task_id: Option<String>,
    pub archive_started_at: Option<DateTimeUtc>,
    pub archive_completed_at: Option<DateTimeUtc>,
    pub archive_path: Option<String>,
    pub archive_error: Option<String>,

    #[sea_orm(has_many)]
    pub products: HasMany<super::retouch_request_product::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
