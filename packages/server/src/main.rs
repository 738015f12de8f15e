use std::net::SocketAddr;
use std::sync::Arc;

use mq::MqConfig;
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::notify::Notifier;
use server::state::AppState;
use server::{consumers, database, jobs, seed, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = Arc::new(AppConfig::load()?);
    utils::jwt::init(&config.auth.jwt_secret);

    let db = database::init_db(&config.database.url).await?;
    seed::seed_role_permissions(&db).await?;
    seed::ensure_indexes(&db).await?;

    let mq = if config.mq.enabled {
        let queue = mq::init_mq(MqConfig {
            url: config.mq.url.clone(),
            pool_size: config.mq.pool_size,
        })
        .await?;
        Some(queue)
    } else {
        warn!("MQ disabled, archive and notification pipelines are off");
        None
    };

    let notifier = Notifier::new(
        mq.clone(),
        config.mq.task_queue_name.clone(),
        config.chat.alert_chat_id,
    );

    if let Some(ref queue) = mq {
        tokio::spawn(consumers::consume_archive_results(
            db.clone(),
            Arc::new(queue.clone()),
            config.mq.result_queue_name.clone(),
            notifier.clone(),
        ));
        tokio::spawn(jobs::run_daily_stats(
            db.clone(),
            queue.clone(),
            config.mq.task_queue_name.clone(),
        ));
    }

    tokio::spawn(jobs::run_priority_sweep(
        db.clone(),
        config.workflow.priority_age_days,
    ));
    tokio::spawn(jobs::run_render_block_sweep(db.clone()));
    tokio::spawn(jobs::run_on_duty_reset(db.clone()));
    tokio::spawn(jobs::run_shooting_check_sweep(db.clone(), notifier.clone()));

    let state = AppState {
        db,
        mq,
        config: config.clone(),
        notifier,
    };
    let app = server::build_router(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Server running at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
