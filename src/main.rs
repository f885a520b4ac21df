use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use tales_core::CoreConfig;

/// Main entry point for the Tales application
///
/// Resolves configuration once, then serves the REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `TALES_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TALES_GENERATION_DELAY_MS`: simulated generation delay (default: 3000)
/// - `TALES_EXPORT_DIR`: directory for exported stories (default: "exports")
/// - `TALES_SESSIONS_DIR`: YAML session directory; unset uses the built-in mock sessions
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tales=info".parse()?)
                .add_directive("tales_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_env_values(
        std::env::var("TALES_GENERATION_DELAY_MS").ok(),
        std::env::var("TALES_EXPORT_DIR").ok(),
        std::env::var("TALES_SESSIONS_DIR").ok(),
    )?);

    let rest_addr = std::env::var("TALES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    match cfg.sessions_dir() {
        Some(dir) => tracing::info!("++ Reading sessions from {}", dir.display()),
        None => tracing::info!("++ Using mock sessions"),
    }
    tracing::info!("++ Starting Tales REST on {}", rest_addr);

    let app = api_rest::router(AppState::new(cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
