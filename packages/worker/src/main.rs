mod config;
mod error;
mod handlers;
mod retention;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::archive_job::ArchiveJob;
use common::notification::ChatMessage;
use common::retry::{RetryDecision, RetryTracker, calculate_backoff, spawn_cleanup_task};
use common::stats::StatsExport;
use common::storage::filesystem::FilesystemPhotoStore;
use common::storage::s3::S3PhotoStore;
use common::storage::PhotoStore;
use common::worker::{TASK_ARCHIVE, TASK_NOTIFY, TASK_STATS_EXPORT, Task};
use mq::{BroccoliError, BrokerMessage, MqConfig, init_mq};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::{StorageConfig, WorkerAppConfig};
use crate::handlers::archive::handle_archive_job;
use crate::handlers::notify::handle_chat_message;
use crate::handlers::stats::handle_stats_export;

struct WorkerContext {
    mq: Arc<mq::Mq>,
    store: Arc<dyn PhotoStore>,
    http: reqwest::Client,
    config: WorkerAppConfig,
    retry_tracker: Arc<Mutex<RetryTracker>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!("Worker starting: {}", config.worker.id);

    let mq = Arc::new(
        init_mq(MqConfig {
            url: config.mq.url.clone(),
            pool_size: config.mq.pool_size,
        })
        .await
        .context("Failed to initialize MQ")?,
    );

    info!(
        task_queue_name = %config.mq.task_queue_name,
        result_queue_name = %config.mq.result_queue_name,
        max_retries = config.retry.max_retries,
        "MQ connected"
    );

    let store = build_store(&config.storage)?;

    tokio::spawn(retention::run_retention_sweep(
        config.archive.output_dir.clone(),
        config.archive.retention_hours,
    ));

    let retry_tracker = Arc::new(Mutex::new(RetryTracker::new(config.retry.max_retries)));

    // TODO: Store handle for graceful shutdown. Currently the task runs until process exit.
    let _cleanup_handle = spawn_cleanup_task(
        retry_tracker.clone(),
        Duration::from_secs(config.retry.cleanup_interval_secs),
        Duration::from_secs(config.retry.max_age_secs),
    );

    let ctx = Arc::new(WorkerContext {
        mq: Arc::clone(&mq),
        store,
        http: reqwest::Client::new(),
        config: config.clone(),
        retry_tracker,
    });

    let result = mq
        .process_messages(
            &config.mq.task_queue_name,
            Some(config.worker.batch_size), // concurrent workers
            None,
            move |message: BrokerMessage<Task>| {
                let ctx = Arc::clone(&ctx);
                async move { process_message(message, &ctx).await }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Worker stopped unexpectedly");
    }

    Ok(())
}

fn build_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn PhotoStore>> {
    match config.backend.as_str() {
        "s3" => {
            let bucket = config
                .bucket
                .as_deref()
                .context("storage.bucket is required for the s3 backend")?;
            let region = config.region.as_deref().unwrap_or("us-east-1");
            let store = S3PhotoStore::new(
                bucket,
                region,
                config.endpoint.as_deref(),
                config.access_key.as_deref(),
                config.secret_key.as_deref(),
            )?;
            Ok(Arc::new(store))
        }
        _ => Ok(Arc::new(FilesystemPhotoStore::new(config.base_path.clone()))),
    }
}

async fn process_message(
    message: BrokerMessage<Task>,
    ctx: &WorkerContext,
) -> Result<(), BroccoliError> {
    let task = message.payload;

    match task.task_type.as_str() {
        TASK_ARCHIVE => process_archive_task(&task, ctx).await,
        TASK_NOTIFY => {
            let chat_message: ChatMessage = match serde_json::from_value(task.payload.clone()) {
                Ok(m) => m,
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Failed to parse ChatMessage, dropping");
                    return Ok(());
                }
            };
            handle_chat_message(&ctx.http, &ctx.config.chat, &chat_message).await;
            Ok(())
        }
        TASK_STATS_EXPORT => process_stats_task(&task, ctx).await,
        other => {
            warn!(task_type = %other, "Unknown task type, skipping");
            Ok(())
        }
    }
}

/// Build the archive with bounded retries. Exhaustion publishes the last
/// failure result so the server can surface the error.
async fn process_archive_task(task: &Task, ctx: &WorkerContext) -> Result<(), BroccoliError> {
    let job: ArchiveJob = match serde_json::from_value(task.payload.clone()) {
        Ok(j) => j,
        Err(e) => {
            error!(task_id = %task.id, error = %e, "Failed to parse ArchiveJob, dropping");
            return Ok(());
        }
    };

    info!(
        job_id = %job.job_id,
        request_number = job.request_number,
        folders = job.folders.len(),
        "Processing archive job"
    );

    let output_dir = PathBuf::from(&ctx.config.archive.output_dir);
    let result_queue = ctx.config.mq.result_queue_name.as_str();

    loop {
        let result = handle_archive_job(ctx.store.as_ref(), &output_dir, &job).await;

        if result.is_success() {
            ctx.retry_tracker.lock().await.clear(&job.job_id);
            publish_result(ctx, result_queue, &result).await?;
            info!(
                job_id = %job.job_id,
                folders_packed = result.folders_packed,
                "Published archive result"
            );
            return Ok(());
        }

        let error_str = result
            .error_info
            .as_ref()
            .map(|info| format!("{}: {}", info.code, info.message))
            .unwrap_or_else(|| "archive build failed".to_string());
        let decision = ctx
            .retry_tracker
            .lock()
            .await
            .record_failure(&job.job_id, &error_str);

        match decision {
            RetryDecision::Retry { attempt, .. } => {
                let delay = calculate_backoff(
                    attempt,
                    ctx.config.retry.base_delay_ms,
                    ctx.config.retry.max_delay_ms,
                );
                warn!(
                    job_id = %job.job_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error_str,
                    "Retrying archive build"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::Exhausted { history } => {
                error!(
                    job_id = %job.job_id,
                    retry_count = history.len(),
                    error = %error_str,
                    "Max retries exhausted, publishing failure"
                );
                publish_result(ctx, result_queue, &result).await?;
                return Ok(());
            }
        }
    }
}

async fn publish_result(
    ctx: &WorkerContext,
    result_queue: &str,
    result: &common::archive_result::ArchiveResult,
) -> Result<(), BroccoliError> {
    ctx.mq
        .publish(result_queue, None, result, None)
        .await
        .map_err(|e| BroccoliError::Publish(format!("Failed to publish ArchiveResult: {e}")))?;
    Ok(())
}

/// Append the stats row with bounded retries; exhaustion drops the row.
async fn process_stats_task(task: &Task, ctx: &WorkerContext) -> Result<(), BroccoliError> {
    let export: StatsExport = match serde_json::from_value(task.payload.clone()) {
        Ok(e) => e,
        Err(e) => {
            error!(task_id = %task.id, error = %e, "Failed to parse StatsExport, dropping");
            return Ok(());
        }
    };

    loop {
        match handle_stats_export(&ctx.http, &ctx.config.stats, &export).await {
            Ok(()) => {
                ctx.retry_tracker.lock().await.clear(&export.export_id);
                return Ok(());
            }
            Err(e) => {
                let error_str = e.to_string();
                let decision = ctx
                    .retry_tracker
                    .lock()
                    .await
                    .record_failure(&export.export_id, &error_str);

                match decision {
                    RetryDecision::Retry { attempt, .. } => {
                        let delay = calculate_backoff(
                            attempt,
                            ctx.config.retry.base_delay_ms,
                            ctx.config.retry.max_delay_ms,
                        );
                        warn!(
                            export_id = %export.export_id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error_str,
                            "Retrying stats export"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::Exhausted { history } => {
                        error!(
                            export_id = %export.export_id,
                            retry_count = history.len(),
                            error = %error_str,
                            "Max retries exhausted, dropping stats row"
                        );
                        return Ok(());
                    }
                }
            }
        }
    }
}
