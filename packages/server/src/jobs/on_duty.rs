use std::time::Duration;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{error, info};

use crate::entity::user_profile;

const RESET_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Clear the on-duty flag on every profile once a day. Duty is opted
/// into each morning through the chat bot.
pub async fn run_on_duty_reset(db: DatabaseConnection) {
    info!("Starting on-duty reset");

    let mut interval = tokio::time::interval(RESET_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = reset_on_duty(&db).await {
            error!(error = %e, "On-duty reset failed");
        }
    }
}

async fn reset_on_duty(db: &DatabaseConnection) -> anyhow::Result<()> {
    let result = user_profile::Entity::update_many()
        .col_expr(user_profile::Column::OnDuty, Expr::value(false))
        .filter(user_profile::Column::OnDuty.eq(true))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(count = result.rows_affected, "Cleared on-duty flags");
    }

    Ok(())
}
