use daily_todo::{AppConfig, AppState, Clock, ClockTicker, FileStore, Session, SystemClock, router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.utc_offset));

    info!("using data file {}", config.data_path.display());
    let store = FileStore::new(&config.data_path);
    let session_clock = Arc::clone(&clock);
    let session =
        tokio::task::spawn_blocking(move || Session::load(Box::new(store), session_clock)).await?;

    let ticker = ClockTicker::spawn(Arc::clone(&clock), Duration::from_secs(1));
    let state = AppState::new(session, ticker.display());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.cancel();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
