use migration_tracker::{router, AppConfig, AppState, LocalStorage, RecordStore, WeatherClient};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    let storage = LocalStorage::open(&config.data_dir).await?;
    info!(dir = %storage.dir().display(), "using data directory");

    let store = RecordStore::open(storage).await;
    let weather = WeatherClient::new(config.weather_url.clone(), config.weather_timeout)?;
    let app = router(AppState::new(store, weather));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
