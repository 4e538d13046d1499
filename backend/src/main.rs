//! Supplies inventory - backend server

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventario_backend::{build_state, create_app, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "inventario_server=debug,inventario_backend=debug,tower_http=debug,sqlx=warn".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("INV_LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    tracing::info!("Starting inventory server");
    tracing::info!("Environment: {}", config.environment);

    let state = build_state(config.clone()).await?;

    if let Some(admin) = &config.bootstrap_admin {
        if state.auth.ensure_admin(&admin.username, &admin.password).await? {
            tracing::info!("Created bootstrap admin account {}", admin.username);
        }
    }

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host/port")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
