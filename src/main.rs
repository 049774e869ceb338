use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the caremap application
///
/// Loads `.env` if present, opens the record store and serves the REST API (with Swagger UI)
/// until interrupted.
///
/// # Environment Variables
/// - `CAREMAP_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CAREMAP_DATABASE`: SQLite database file (default: "caremap.db")
/// - `CAREMAP_JWT_SECRET`: token signing secret, at least 32 bytes (required)
/// - `CAREMAP_ACCESS_TOKEN_MINUTES`, `CAREMAP_REFRESH_TOKEN_HOURS`: token lifetimes
/// - `CAREMAP_ADMIN_DELETES_ANY_ASSIGNMENT`: administrator assignment deletion (default: false)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("caremap_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("caremap_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CAREMAP_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let state = api_rest::state_from_env()?;
    let app = api_rest::router(state);

    tracing::info!("++ Starting caremap REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- caremap stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
