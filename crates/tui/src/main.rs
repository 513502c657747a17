//! Entry point for the Canopy TUI.

use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};

use canopy_core::config::API_URL_ENV;
use canopy_core::{AppContext, Config, Notifier, QueueSink};
use canopy_tui::{App, TuiResult};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file; logging is off without it
const LOG_FILE_ENV: &str = "CANOPY_LOG_FILE";

/// Interactive placement tree viewer for the Canopy MLM platform
#[derive(Parser)]
#[command(name = "cnp-tui")]
#[command(version = "0.1.0")]
#[command(about = "Interactive placement tree viewer for the Canopy MLM platform", long_about = None)]
struct Args {
    /// API base URL including /api/v1 (can also be set via CANOPY_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Session cookie file written by `cnp login` (can also be set via CANOPY_SESSION)
    #[arg(long)]
    session: Option<PathBuf>,
}

/// Send logs to the file named by CANOPY_LOG_FILE, filtered by RUST_LOG.
///
/// The alternate screen owns the terminal, so nothing is written to stderr.
fn init_logging() {
    let Some(path) = std::env::var_os(LOG_FILE_ENV).filter(|p| !p.is_empty()) else {
        return;
    };
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("warning: cannot open log file {:?}: {}", path, e);
            return;
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run_app().await {
        eprintln!("error: {}", e.full_message());
        if e.is_unauthenticated() {
            eprintln!("hint: run `cnp login` to start a session, then try again");
        } else if matches!(e, canopy_tui::TuiError::Api(_)) {
            eprintln!("hint: check the API URL (--api-url or {})", API_URL_ENV);
        }
        process::exit(1);
    }
}

/// Main application logic - separated for testability
async fn run_app() -> TuiResult<()> {
    let args = Args::parse();
    let config = resolve_config(&args);
    let sink = Arc::new(QueueSink::new());
    let ctx = AppContext::init(config, Notifier::new(sink.clone()))?;

    let mut app = App::new(ctx, sink).await?;
    app.run().await
}

/// Resolve the configuration: flag, then environment, then default
fn resolve_config(args: &Args) -> Config {
    Config::resolve(args.api_url.clone(), None, args.session.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::try_parse_from(["cnp-tui"]).unwrap();
        assert!(args.api_url.is_none());
        assert!(args.session.is_none());
    }

    #[test]
    fn test_explicit_flags_win_in_config() {
        let args = Args::try_parse_from([
            "cnp-tui",
            "--api-url",
            "http://127.0.0.1:5000/api/v1",
            "--session",
            "/tmp/canopy-session",
        ])
        .unwrap();
        let config = resolve_config(&args);
        assert_eq!(config.api_url, "http://127.0.0.1:5000/api/v1");
        assert_eq!(config.session_path, PathBuf::from("/tmp/canopy-session"));
    }

    #[test]
    fn test_rejects_subcommands() {
        assert!(Args::try_parse_from(["cnp-tui", "tree"]).is_err());
    }
}
