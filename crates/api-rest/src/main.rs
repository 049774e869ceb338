//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `caremap-run` binary serves the
//! same router after applying a `.env` file.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the caremap REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `CAREMAP_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - see [`api_rest::state_from_env`] for the rest
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration is invalid or the database cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("caremap_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CAREMAP_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting caremap REST API on {}", addr);

    let state = api_rest::state_from_env()?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
