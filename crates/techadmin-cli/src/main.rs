use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use techadmin_application::AdminConsole;
use techadmin_core::config::RootConfig;
use techadmin_infrastructure::{ConfigService, RestBackend, RestSettings, SessionFile};
use tracing_subscriber::EnvFilter;

mod command;
mod form;
mod helper;
mod render;
mod repl;

use helper::CliHelper;
use repl::Repl;

pub type LineEditor = Editor<CliHelper, DefaultHistory>;

#[derive(Parser)]
#[command(name = "techadmin")]
#[command(about = "techadmin - administrative console for the technique catalogue", long_about = None)]
struct Args {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(config: &RootConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ===== Configuration =====
    let config_service = ConfigService::resolve(args.config)?;
    let config = config_service
        .load()
        .with_context(|| format!("failed to read {}", config_service.path().display()))?;
    init_tracing(&config, args.log_level.as_deref());
    tracing::debug!("[Main] using config {}", config_service.path().display());

    // ===== Backend Initialization =====
    let settings = RestSettings::from_config(&config).context(
        "the backend URL is not configured; set [backend] url or TECHADMIN_API_URL",
    )?;
    let backend = Arc::new(
        RestBackend::new(settings)?.with_session_file(SessionFile::default_location()?),
    );
    let console = Arc::new(AdminConsole::new(
        backend.clone(),
        backend.clone(),
        backend,
        config.catalogue.page_size,
    ));

    console.start().await;
    console.wait_for_access().await;

    // ===== REPL Setup =====
    let mut rl: LineEditor = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    let result = Repl::new(Arc::clone(&console), rl).run().await;
    console.shutdown();
    result
}
