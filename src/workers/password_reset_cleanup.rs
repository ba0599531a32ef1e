use crate::DbPool;
use crate::queries::password_resets;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Background worker that periodically deletes expired and used password reset tokens
pub async fn password_reset_cleanup_worker(
    pool: DbPool,
    interval_seconds: u64,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) {
    let mut cleanup_interval = interval(Duration::from_secs(interval_seconds.max(1)));
    info!(interval_seconds, "Password reset cleanup worker started");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Password reset cleanup worker shutting down");
                break;
            }
            _ = cleanup_interval.tick() => {
                let mut conn = match pool.acquire().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to acquire database connection for cleanup: {}", e);
                        continue;
                    }
                };

                match password_resets::delete_stale_reset_tokens(&mut conn).await {
                    Ok(count) => {
                        if count > 0 {
                            info!("Cleaned up {} expired or used password reset tokens", count);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to cleanup password reset tokens: {}", e);
                    }
                }
            }
        }
    }

    info!("Password reset cleanup worker stopped");
}
