mod action;
mod app;
mod app_state;
mod command;
mod component;
mod components;
mod log_layer;
mod theme;
mod widgets;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use hub_client::ClientSession;
use hub_proto::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_path = hub_proto::platform::log_path("hub");
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // WARN/ERROR lines also go to the log panel.
    let (log_tx, log_rx) = mpsc::unbounded_channel::<String>();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(log_layer::ForwardLayer::new(log_tx))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,hub_client=debug,hub_tui=debug,hyper_util=warn,reqwest=warn",
                )
            }),
        )
        .init();

    eprintln!("hub log: {}", log_path.display());
    tracing::info!("hub tui starting…");

    let config = Config::load().context("loading hub config")?;
    tracing::info!("config loaded from {:?}", Config::config_path());

    let (events_tx, events_rx) = hub_client::event::channel();
    let session = ClientSession::new(config, events_tx.clone()).context("building hub client")?;

    app::App::new(session, events_tx)
        .run(events_rx, log_rx)
        .await
}
