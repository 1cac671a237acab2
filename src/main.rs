use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::{api, config::Config, db, db::queries::SqliteTodoStore, service::TodoService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Todo API...");

    let pool = db::init_pool(&config.db_url).await?;

    tracing::info!("Database connection pool established.");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    let cancel_token = CancellationToken::new();

    let store = Arc::new(SqliteTodoStore::new(pool.clone()));
    let service = TodoService::new(store, config.backend_timeout);
    tracing::info!(
        timeout_ms = config.backend_timeout.as_millis() as u64,
        "Todo service initialized."
    );

    let app = api::router(service);
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("API Server listening on {}", addr);

    tokio::spawn(shutdown_signal(cancel_token.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_token.cancelled_owned())
        .await?;

    pool.close().await;
    tracing::info!("Application shut down gracefully.");

    Ok(())
}

/// Listens for shutdown signals (Ctrl+C or termination) and triggers cancellation.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received.");
    token.cancel();
}
