use tokio::signal;

/// Resolves on Ctrl+C so the caller can tear down (flush progress) before exiting.
pub async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }

    #[cfg(not(windows))]
    println!();
    tracing::info!("Ctrl+C received, saving progress before exit.");
}
