//! Pops message ids from the Redis broker and delivers them through Twilio.

use anyhow::Context as _;
use clap::Parser;
use sea_orm::Database;
use tracing::{info, warn};

use postbox_core::config::Config as _;
use postbox_core::tracing::init_tracing;
use postbox_messages::config::PipelineConfig;
use postbox_messages::daemon::shutdown_on_ctrl_c;
use postbox_messages::daemon::worker::WorkerLoop;
use postbox_messages::infra::broker::RedisBroker;
use postbox_messages::infra::db::DbMessageRepository;
use postbox_messages::infra::gateway::TwilioGateway;

#[derive(Parser)]
#[command(about = "Deliver enqueued messages")]
struct Args {
    /// Broker pop timeout in seconds; overrides WORKER_POP_TIMEOUT_SECS.
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = PipelineConfig::from_env().context("load pipeline config")?;
    if let Some(timeout) = args.timeout {
        config.worker_pop_timeout_secs = timeout;
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

    let gateway = TwilioGateway::new(
        config.twilio_api_base.clone(),
        config.twilio_credentials(),
        config.gateway_timeout(),
    )?;
    if !gateway.has_credentials() {
        warn!("TWILIO_ACCOUNT_SID/TWILIO_AUTH_TOKEN not set, deliveries will fail");
    }

    let worker = WorkerLoop::new(
        DbMessageRepository { db },
        broker,
        gateway,
        config.worker_pop_timeout(),
        shutdown_on_ctrl_c(),
    );
    worker.run().await;
    Ok(())
}
