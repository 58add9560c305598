use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use postbox_core::config::Config as _;
use postbox_core::tracing::init_tracing;
use postbox_messages::config::ApiConfig;
use postbox_messages::router::build_router;
use postbox_messages::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ApiConfig::from_env().context("load api config")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let state = AppState {
        db,
        default_sender: config.default_sender().map(str::to_owned),
    };
    if state.default_sender.is_none() {
        info!("no DEFAULT_SENDER configured, requests must name a sender");
    }

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.messages_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("bind {http_addr}"))?;

    info!("messages service listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;
    Ok(())
}
