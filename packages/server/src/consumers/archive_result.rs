use std::sync::Arc;

use chrono::Utc;
use common::archive_result::ArchiveResult;
use mq::{BroccoliError, BrokerMessage, Mq};
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set, TransactionTrait};
use tracing::{error, info, warn};

use crate::entity::retouch_request;
use crate::notify::{Notifier, OutboundEvent};

/// Consume archive-build results from the result queue.
pub async fn consume_archive_results(
    db: DatabaseConnection,
    mq: Arc<Mq>,
    queue_name: String,
    notifier: Notifier,
) {
    info!(queue = %queue_name, "Starting archive result consumer");

    let result = mq
        .process_messages(
            &queue_name,
            None, // single-threaded for sequential DB writes
            None,
            move |message: BrokerMessage<ArchiveResult>| {
                let db = db.clone();
                let notifier = notifier.clone();
                async move {
                    let result = message.payload;
                    let request_id = result.retouch_request_id;
                    let job_id = result.job_id.clone();

                    if let Err(e) = process_archive_result(&db, &notifier, result).await {
                        error!(
                            request_id,
                            job_id = %job_id,
                            error = %e,
                            "Failed to process archive result"
                        );
                        return Err(BroccoliError::Job(e.to_string()));
                    }
                    Ok(())
                }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Archive result consumer stopped unexpectedly");
    }
}

/// Process a single archive result.
async fn process_archive_result(
    db: &DatabaseConnection,
    notifier: &Notifier,
    result: ArchiveResult,
) -> anyhow::Result<()> {
    let txn = db.begin().await?;

    let request = retouch_request::Entity::find_by_id(result.retouch_request_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!("Retouch request {} not found", result.retouch_request_id)
        })?;

    // A newer build may have been scheduled while this one ran.
    if request.archive_task_id.as_deref() != Some(result.job_id.as_str()) {
        warn!(
            request_id = request.id,
            job_id = %result.job_id,
            current_task = ?request.archive_task_id,
            "Stale archive result, skipping"
        );
        txn.commit().await?;
        return Ok(());
    }

    if request.archive_completed_at.is_some() {
        info!(
            request_id = request.id,
            job_id = %result.job_id,
            "Archive result already processed, skipping"
        );
        txn.commit().await?;
        return Ok(());
    }

    let success = result.is_success();
    let mut update = retouch_request::ActiveModel {
        id: Set(request.id),
        ..Default::default()
    };
    let failure_reason = if success {
        update.archive_completed_at = Set(Some(Utc::now()));
        update.archive_path = Set(result.archive_path.clone());
        update.archive_error = Set(None);
        None
    } else {
        let reason = result
            .error_info
            .as_ref()
            .map(|info| format!("{}: {}", info.code, info.message))
            .unwrap_or_else(|| "archive build failed".to_string());
        update.archive_error = Set(Some(reason.clone()));
        Some(reason)
    };
    update.update(&txn).await?;

    txn.commit().await?;

    info!(
        request_id = request.id,
        job_id = %result.job_id,
        success,
        folders_packed = result.folders_packed,
        folders_total = result.folders_total,
        "Processed archive result"
    );

    let event = match failure_reason {
        None => OutboundEvent::ArchiveReady {
            retoucher_id: request.retoucher_id,
            request_number: request.request_number,
        },
        Some(reason) => OutboundEvent::ArchiveFailed {
            retoucher_id: request.retoucher_id,
            request_number: request.request_number,
            reason,
        },
    };
    notifier.send(db, event).await;

    Ok(())
}
