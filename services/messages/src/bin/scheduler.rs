//! Promotes due messages from the record store onto the Redis broker.

use anyhow::Context as _;
use clap::Parser;
use sea_orm::Database;
use tracing::info;

use postbox_core::config::Config as _;
use postbox_core::tracing::init_tracing;
use postbox_messages::config::PipelineConfig;
use postbox_messages::daemon::scheduler::SchedulerLoop;
use postbox_messages::daemon::shutdown_on_ctrl_c;
use postbox_messages::infra::broker::RedisBroker;
use postbox_messages::infra::db::DbMessageRepository;

#[derive(Parser)]
#[command(about = "Enqueue due scheduled messages")]
struct Args {
    /// Seconds between cycles; overrides SCHEDULER_INTERVAL_SECS.
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = PipelineConfig::from_env().context("load pipeline config")?;
    if let Some(interval) = args.interval {
        config.scheduler_interval_secs = interval;
    }
    config.validate()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let broker = RedisBroker::connect(
        &config.redis_connection_url(),
        &config.redis_queue_key,
        config.worker_pop_timeout(),
    )?;
    broker.ping().await.context("redis unreachable at startup")?;
    info!(queue = %config.redis_queue_key, "connected to redis");

    let scheduler = SchedulerLoop::new(
        DbMessageRepository { db },
        broker,
        config.scheduler_interval(),
        config.stale_processing_after(),
        shutdown_on_ctrl_c(),
    );
    scheduler.run().await;
    Ok(())
}
