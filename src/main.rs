// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use studio_pass::{Config, PlanKind};

#[derive(Parser)]
#[command(name = "studio-pass", version, about = "Demo image editor with plans, credits and reward tasks")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where log output goes while the terminal UI owns the screen
    #[arg(long, default_value = "studio-pass.log")]
    log_file: PathBuf,

    /// Directory for edit/merge results
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the terminal UI (default)
    Ui,
    /// Print the effective configuration as JSON
    Config,
    /// List the subscription plans the generator can issue
    Plans,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Config => print_config(&config)?,
        Command::Plans => print_plans(),
        Command::Ui => {
            init_file_logging(&cli.log_file)?;
            run_ui_mode(config, cli.output_dir)?;
        }
    }

    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file
fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create log file: {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("studio_pass=info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn print_config(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}

fn print_plans() {
    println!("🎟️  Generatable plans");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for kind in PlanKind::ALL {
        let validity = match kind.duration() {
            Some(duration) => format!("{} day(s)", duration.num_days()),
            None => "never expires".to_string(),
        };
        println!("  {:<10} {:<10} {}", kind.key(), kind.label(), validity);
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: Config, output_dir: PathBuf) -> Result<()> {
    use std::sync::Arc;
    use std::time::Duration;
    use studio_pass::{shared, spawn_expiry_sweep, GeminiGenerator, SessionController, SystemClock};

    println!("🖥️  Loading Studio Pass...\n");

    if config.generator.api_key.is_none() {
        println!("⚠️  API_KEY is not set: edits and merges will fail until it is.");
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let generator = GeminiGenerator::new(&config.generator).context("Failed to build image client")?;
    let controller = shared(SessionController::new(&config, Arc::new(SystemClock)));

    let sweep = {
        let _guard = runtime.enter();
        spawn_expiry_sweep(controller.clone(), Duration::from_millis(config.sweep_interval_ms))
    };

    println!("Starting UI... (Press Esc to quit)\n");

    let mut app = ui::App::new(controller, Arc::new(generator), runtime.handle().clone(), output_dir);
    ui::run_ui(&mut app)?;

    sweep.abort();
    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: Config, _output_dir: PathBuf) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin studio-server --features server");
    std::process::exit(1);
}
