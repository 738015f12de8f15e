use std::time::Duration;

use chrono::Utc;
use common::MoveStatus;
use common::stats::StatsExport;
use common::worker::{TASK_STATS_EXPORT, Task};
use mq::MqQueue;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{error, info};

use crate::entity::product;

const EXPORT_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Publish a daily product-count row; the worker appends it to the
/// external spreadsheet.
pub async fn run_daily_stats(db: DatabaseConnection, mq: MqQueue, queue_name: String) {
    info!(queue = %queue_name, "Starting daily stats export");

    let mut interval = tokio::time::interval(EXPORT_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = export_daily_stats(&db, &mq, &queue_name).await {
            error!(error = %e, "Daily stats export failed");
        }
    }
}

async fn export_daily_stats(
    db: &DatabaseConnection,
    mq: &MqQueue,
    queue_name: &str,
) -> anyhow::Result<()> {
    let mut counts = Vec::with_capacity(MoveStatus::ALL.len());
    for status in MoveStatus::ALL {
        let count = product::Entity::find()
            .filter(product::Column::MoveStatus.eq(*status))
            .count(db)
            .await?;
        counts.push((status.as_str().to_string(), count));
    }

    let export = StatsExport::new(Utc::now().date_naive(), counts);
    let task = Task::wrap(TASK_STATS_EXPORT, &export)?;
    mq.publish(queue_name, None, &task, None).await?;

    info!(export_id = %export.export_id, "Published daily stats export");

    Ok(())
}
