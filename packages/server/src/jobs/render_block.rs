use std::time::Duration;

use common::{RetouchRequestStatus, SeniorRetouchStatus};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use tracing::{error, info};

use crate::entity::{product, retouch_request, retouch_request_product, shooting_request_product};

const SCAN_INTERVAL: Duration = Duration::from_secs(300);

/// Keep `product.blocked_for_render` in sync with retouch state.
pub async fn run_render_block_sweep(db: DatabaseConnection) {
    info!("Starting render block sweep");

    let mut interval = tokio::time::interval(SCAN_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = sync_render_blocks(&db).await {
            error!(error = %e, "Render block sweep failed");
        }
    }
}

/// Recompute the blocked set in one transaction: a product is blocked
/// while it sits in an open retouch request and its line is not yet
/// verified by the senior.
pub async fn sync_render_blocks(db: &DatabaseConnection) -> anyhow::Result<()> {
    let txn = db.begin().await?;

    let open_ids: Vec<i32> = retouch_request::Entity::find()
        .select_only()
        .column(retouch_request::Column::Id)
        .filter(retouch_request::Column::Status.ne(RetouchRequestStatus::Completed))
        .into_tuple()
        .all(&txn)
        .await?;

    let mut blocked: Vec<String> = Vec::new();
    if !open_ids.is_empty() {
        let unverified_lines: Vec<i32> = retouch_request_product::Entity::find()
            .select_only()
            .column(retouch_request_product::Column::StProductId)
            .filter(retouch_request_product::Column::RetouchRequestId.is_in(open_ids))
            .filter(
                retouch_request_product::Column::SeniorRetouchStatus
                    .ne(SeniorRetouchStatus::Verified)
                    .or(retouch_request_product::Column::SeniorRetouchStatus.is_null()),
            )
            .into_tuple()
            .all(&txn)
            .await?;

        if !unverified_lines.is_empty() {
            blocked = shooting_request_product::Entity::find()
                .select_only()
                .column(shooting_request_product::Column::Barcode)
                .filter(shooting_request_product::Column::Id.is_in(unverified_lines))
                .into_tuple()
                .all(&txn)
                .await?;
            blocked.sort();
            blocked.dedup();
        }
    }

    let unblocked = product::Entity::update_many()
        .col_expr(product::Column::BlockedForRender, Expr::value(false))
        .filter(product::Column::BlockedForRender.eq(true))
        .filter(product::Column::Barcode.is_not_in(blocked.clone()))
        .exec(&txn)
        .await?;

    let mut newly_blocked = 0;
    if !blocked.is_empty() {
        let result = product::Entity::update_many()
            .col_expr(product::Column::BlockedForRender, Expr::value(true))
            .filter(product::Column::BlockedForRender.eq(false))
            .filter(product::Column::Barcode.is_in(blocked))
            .exec(&txn)
            .await?;
        newly_blocked = result.rows_affected;
    }

    txn.commit().await?;

    if unblocked.rows_affected > 0 || newly_blocked > 0 {
        info!(
            blocked = newly_blocked,
            unblocked = unblocked.rows_affected,
            "Synced render blocks"
        );
    }

    Ok(())
}
