// Studio Pass - Web Server
// REST intent API with Axum, plus the background expiry sweep

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use studio_pass::api::{router, AppState};
use studio_pass::{shared, spawn_expiry_sweep, Config, GeminiGenerator, SessionController, SystemClock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studio-server", version, about = "HTTP API for the Studio Pass session model")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `server.bind` from the configuration
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("studio_pass=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    println!("🌐 Studio Pass - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config.generator.api_key.is_none() {
        warn!("API_KEY is not set; edit and merge requests will fail");
    }

    let generator = GeminiGenerator::new(&config.generator).context("Failed to build image client")?;
    let controller = shared(SessionController::new(&config, Arc::new(SystemClock)));
    let _sweep = spawn_expiry_sweep(controller.clone(), Duration::from_millis(config.sweep_interval_ms));

    let app = router(AppState {
        controller,
        generator: Arc::new(generator),
    });

    // Start server
    let addr = cli.bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    info!(%addr, "listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/session", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
