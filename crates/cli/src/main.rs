use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use canopy_cli::{CliResult, Command, StderrSink};
use canopy_core::config::{API_URL_ENV, SESSION_PATH_ENV, SITE_URL_ENV};
use canopy_core::{AppContext, Config, Notifier};

/// Canopy - command line client for the Canopy MLM platform
#[derive(Parser)]
#[command(name = "cnp")]
#[command(version = "0.1.0")]
#[command(about = "Command line client for the Canopy MLM platform", long_about = None)]
struct Args {
    /// API base URL including /api/v1 (can also be set via CANOPY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Public site URL used in registration links (can also be set via CANOPY_SITE_URL)
    #[arg(long, global = true)]
    site_url: Option<String>,

    /// Session cookie file (can also be set via CANOPY_SESSION)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Initialize logging from the RUST_LOG environment variable
///
/// Examples:
/// - `RUST_LOG=debug` - show debug and above
/// - `RUST_LOG=canopy_core=trace` - trace the API client only
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run_app().await {
        eprintln!("error: {}", e.full_message());
        process::exit(1);
    }
}

/// Main application logic - separated for testability
async fn run_app() -> CliResult<()> {
    let args = Args::parse();
    run_with_args(&args).await
}

/// Resolve the configuration: flag, then environment, then default
fn resolve_config(args: &Args) -> Config {
    Config::resolve(
        args.api_url.clone(),
        args.site_url.clone(),
        args.session.clone(),
    )
}

/// Run the application with the given arguments
async fn run_with_args(args: &Args) -> CliResult<()> {
    match &args.command {
        Some(cmd) => {
            let config = resolve_config(args);
            debug!(
                "Using API {} with session file {}",
                config.api_url,
                config.session_path.display()
            );
            let ctx = AppContext::init(config, Notifier::new(Arc::new(StderrSink)))?;
            let output = cmd.execute(&ctx).await?;
            println!("{}", output);
        }
        None => {
            println!("Welcome to Canopy!");
            println!("Use 'cnp --help' for usage information.");
            println!(
                "Settings can also come from {}, {} and {}.",
                API_URL_ENV, SITE_URL_ENV, SESSION_PATH_ENV
            );
        }
    }

    Ok(())
}
