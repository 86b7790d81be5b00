//! adnstream binary entry point

use std::path::PathBuf;

use adnstream::{AppState, config};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "adnstream")]
#[command(version)]
#[command(about = "Sign in with App.net and read the global stream")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "ADNSTREAM_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides server.port)
    #[arg(long)]
    port: Option<u16>,
}

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize AppState
/// 4. Build Axum router
/// 5. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 1. Load configuration
    let mut config = config::AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // 2. Initialize tracing/logging
    init_tracing(&config.logging);

    tracing::info!("Starting adnstream...");
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        config_path = ?config.config_path,
        "Configuration loaded"
    );
    if !config.should_use_secure_cookies() {
        tracing::warn!(
            domain = %config.server.domain,
            protocol = %config.server.protocol,
            "Using insecure session cookies for local development"
        );
    }

    adnstream::metrics::init_metrics();

    // 3. Initialize application state
    let state = AppState::new(config.clone())?;

    // 4. Build Axum router
    let app = adnstream::build_router(state);

    // 5. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", config.server.base_url());

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("adnstream={},tower_http=debug", logging.level).into()
    });

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
