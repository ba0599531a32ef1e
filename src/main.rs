use bookineo::{
    AppState, build_router, database, load_config,
    services::{chat::ChatService, email::create_email_service},
    workers::password_reset_cleanup_worker,
};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookineo=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    tracing::debug!("Loaded configuration:\n{}", config);

    let pool = database::connect(&config.database).await?;
    database::migrate(&pool).await?;

    let email = create_email_service(&config.email)?;
    let chat = ChatService::new(config.chat.clone())?;
    let bind_address = config.server.bind_address();
    let cleanup_interval = config.password_reset.cleanup_interval_seconds;

    let state = AppState::new(pool.clone(), config, email, chat);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let cleanup_handle = tokio::spawn(password_reset_cleanup_worker(
        pool,
        cleanup_interval,
        shutdown_tx.subscribe(),
    ));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(());
    if let Err(e) = cleanup_handle.await {
        tracing::warn!(error = %e, "Cleanup worker ended abnormally");
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
