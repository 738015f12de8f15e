use std::time::Duration;

use chrono::Utc;
use common::MoveStatus;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{error, info};

use crate::entity::product;

const SCAN_INTERVAL: Duration = Duration::from_secs(3600);

/// Promote long-lived stock to priority as a background task.
pub async fn run_priority_sweep(db: DatabaseConnection, age_days: i64) {
    info!(age_days, "Starting priority sweep");

    let mut interval = tokio::time::interval(SCAN_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = promote_stale_products(&db, age_days).await {
            error!(error = %e, "Priority sweep failed");
        }
    }
}

/// Flag every non-priority in-warehouse product whose income is older
/// than the age threshold.
async fn promote_stale_products(db: &DatabaseConnection, age_days: i64) -> anyhow::Result<()> {
    let threshold = Utc::now() - chrono::Duration::days(age_days);
    let present: Vec<MoveStatus> = MoveStatus::ALL
        .iter()
        .copied()
        .filter(MoveStatus::is_in_warehouse)
        .collect();

    let result = product::Entity::update_many()
        .col_expr(product::Column::Priority, Expr::value(true))
        .filter(product::Column::Priority.eq(false))
        .filter(product::Column::MoveStatus.is_in(present))
        .filter(product::Column::IncomeAt.lte(threshold))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(
            count = result.rows_affected,
            "Promoted stale products to priority"
        );
    }

    Ok(())
}
