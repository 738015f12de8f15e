use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chat identity and duty flags for a user. One row per user, created
/// lazily when the chat bot first links an account.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub chat_id: Option<i64>,
    pub chat_name: Option<String>,
    pub phone: Option<String>,

    /// On-duty members receive workload assignments and alert fan-out.
    pub on_duty: bool,
}

impl ActiveModelBehavior for ActiveModel {}
