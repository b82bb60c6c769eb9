use std::net::SocketAddr;
use tracing::{debug, error, info};
use tribute_wall::{
    config::{BackendKind, RemoteConfig, ServerConfig},
    remote::RestTable,
    storage::{FileBackend, RowBackend},
    AppState, Backend, CounterStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tribute_wall::init_environment();

    let config = ServerConfig::from_env()?;
    debug!(port = config.port, backend = ?config.backend, "server configuration");
    let backend = match config.backend {
        BackendKind::File => {
            info!("storing tributes in {}", config.data_path.display());
            Backend::File(FileBackend::new(&config.data_path))
        }
        BackendKind::Remote => {
            let remote = RemoteConfig::from_env().inspect_err(|err| {
                error!("remote backend selected but not configured: {err}");
            })?;
            info!("storing tributes in {}", remote.url);
            Backend::Remote(RowBackend::new(RestTable::new(&remote)))
        }
    };

    let store = CounterStore::open(backend).await;
    let counters = store.counters();
    info!(candles = counters.candles, flowers = counters.flowers, "tributes loaded");

    let app = tribute_wall::router(AppState::new(store));
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
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
