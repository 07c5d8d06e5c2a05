use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, ServerConfig};
use wallpaper_core::{CatalogService, CoreConfig};

/// Main entry point for the wallpaper catalog server
///
/// Opens the catalog database and image store, then serves the REST API,
/// Swagger UI and the static public directory until Ctrl-C.
///
/// # Environment Variables
/// - `WALLPAPER_REST_ADDR`: server address (default: "0.0.0.0:<PORT>")
/// - `PORT`: port used when no address is given (default: 3000)
/// - `WALLPAPER_DB_PATH`: SQLite database file (default: "wallpapers.db")
/// - `WALLPAPER_PUBLIC_DIR`: static root; images are stored in its `uploads/` folder (default: "public")
/// - `CORS_ORIGIN`: the single origin allowed by CORS (default: "http://localhost:3000")
/// - `RATE_LIMIT_MAX`: requests allowed per client in each window (default: 100)
/// - `RATE_LIMIT_WINDOW_SECS`: rate-limit window length in seconds (default: 900)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration values are invalid,
/// - the database or image store cannot be opened, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wallpaper_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("wallpaper_core=info".parse()?)
                .add_directive("wallpaper_files=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_cfg = ServerConfig::from_env()?;
    let core_cfg = CoreConfig::from_env_values(
        std::env::var("WALLPAPER_DB_PATH").ok(),
        std::env::var("WALLPAPER_PUBLIC_DIR").ok(),
    )?;

    let service = CatalogService::open(&core_cfg).await?;
    let app = api_rest::router(AppState::new(service), core_cfg.public_dir(), &server_cfg);

    tracing::info!("++ Starting wallpaper catalog on {}", server_cfg.addr());

    let listener = tokio::net::TcpListener::bind(server_cfg.addr()).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("-- Wallpaper catalog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
}
