use clap::Parser;
use tracing::{info, warn};

use keyforge_core::tracing_init::{DEFAULT_FILTER, LogFormat, init_tracing};
use keyforge_server::bot::{BotPoller, CommandHandler, TelegramClient};
use keyforge_server::config::{Args, Config};
use keyforge_server::http::{AppState, build_router};
use keyforge_server::service::LicenseService;
use keyforge_server::storage::LicenseDatabase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args(Args::parse())?;
    init_tracing(DEFAULT_FILTER, LogFormat::from_json_flag(config.log_json));

    info!(
        addr = %config.addr,
        operators = config.bot.operators.len(),
        "Starting keyforge server"
    );
    if config.bot.operators.is_empty() {
        warn!("No operators configured; every administrative bot command will be denied");
    }

    let db = LicenseDatabase::open(&config.database_url).await?;
    let service = LicenseService::new(db, config.store_timeout);

    let client = TelegramClient::new(&config.bot)?;
    let handler = CommandHandler::new(
        service.clone(),
        config.bot.operators.clone(),
        config.bot.public_greeting.clone(),
    );
    let poller = BotPoller::new(client, handler, config.bot.poll_timeout);

    let app = build_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "HTTP server ready");

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    #[cfg(unix)]
    let sigterm_future = sigterm.recv();
    #[cfg(not(unix))]
    let sigterm_future = std::future::pending::<Option<()>>();

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        result = poller.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C shutdown signal");
        }
        _ = sigterm_future => {
            info!("Received SIGTERM shutdown signal");
        }
    }

    info!("keyforge server stopped");
    Ok(())
}
