use std::time::Duration;

use chrono::Utc;
use common::{PhotoStatus, SeniorPhotoStatus, ShootingRequestStatus};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{error, info};

use crate::entity::{shooting_request, shooting_request_product};
use crate::notify::{Notifier, OutboundEvent};

const SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Roll shooting requests out of PendingCheck once the senior has a
/// verdict on every shot product.
pub async fn run_shooting_check_sweep(db: DatabaseConnection, notifier: Notifier) {
    info!("Starting shooting check sweep");

    let mut interval = tokio::time::interval(SCAN_INTERVAL);

    loop {
        interval.tick().await;

        if let Err(e) = roll_checked_requests(&db, &notifier).await {
            error!(error = %e, "Shooting check sweep failed");
        }
    }
}

/// One pass over every PendingCheck request.
pub async fn roll_checked_requests(
    db: &DatabaseConnection,
    notifier: &Notifier,
) -> anyhow::Result<()> {
    let pending_ids: Vec<i32> = shooting_request::Entity::find()
        .select_only()
        .column(shooting_request::Column::Id)
        .filter(shooting_request::Column::Status.eq(ShootingRequestStatus::PendingCheck))
        .into_tuple()
        .all(db)
        .await?;

    for request_id in pending_ids {
        if let Err(e) = roll_one(db, notifier, request_id).await {
            error!(request_id, error = %e, "Failed to roll shooting request");
        }
    }

    Ok(())
}

/// Check one PendingCheck request; transition to Checked and notify the
/// photographer when every member is settled. Members the photographer
/// flagged as defective are exempt from the senior check.
async fn roll_one(
    db: &DatabaseConnection,
    notifier: &Notifier,
    request_id: i32,
) -> anyhow::Result<()> {
    let txn = db.begin().await?;

    let request = shooting_request::Entity::find_by_id(request_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let Some(request) = request else {
        txn.rollback().await?;
        return Ok(());
    };

    if request.status != ShootingRequestStatus::PendingCheck {
        txn.rollback().await?;
        return Ok(());
    }

    let members = shooting_request_product::Entity::find()
        .filter(shooting_request_product::Column::RequestId.eq(request.id))
        .all(&txn)
        .await?;

    let mut rejected_count = 0;
    let mut all_settled = !members.is_empty();
    for member in &members {
        if member.photo_status == PhotoStatus::Defect {
            continue;
        }
        if member.senior_photo_status == SeniorPhotoStatus::Rejected {
            rejected_count += 1;
            continue;
        }
        if !ShootingRequestStatus::member_checked(member.photo_status, member.senior_photo_status) {
            all_settled = false;
            break;
        }
    }

    if !all_settled {
        txn.rollback().await?;
        return Ok(());
    }

    let mut active: shooting_request::ActiveModel = request.clone().into();
    active.status = Set(ShootingRequestStatus::Checked);
    active.checked_at = Set(Some(Utc::now()));
    active.update(&txn).await?;

    txn.commit().await?;

    info!(
        request_id = request.id,
        request_number = request.request_number,
        rejected_count,
        "Shooting request checked"
    );

    if let Some(photographer_id) = request.photographer_id {
        notifier
            .send(
                db,
                OutboundEvent::ShootingChecked {
                    photographer_id,
                    request_number: request.request_number,
                    rejected_count,
                },
            )
            .await;
    }

    Ok(())
}
