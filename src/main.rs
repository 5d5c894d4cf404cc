//! TTS Tester - desktop tool for trying out text-to-speech models
//!
//! Run with: cargo run --bin tts-tester

use anyhow::Result;
use clap::Parser;
use iced::{application, Size};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use tts_tester::config::{self, Config};
use tts_tester::gui::{AppFlags, TesterApp};
use tts_tester::tts::EngineKind;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Speaker tags file, overrides the config
    #[arg(short, long)]
    tags_file: Option<PathBuf>,

    /// TTS engine: coqui or piper
    #[arg(short, long)]
    engine: Option<EngineKind>,
}

/// Load the config before logging is set up.
///
/// The log level lives in the config, so problems with it are reported
/// through a temporary warn-level subscriber writing to `writer`.
fn load_config<W>(path: &Path, writer: W) -> Config
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let early = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_ansi(false)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(early, || {
        Config::load_from(path).unwrap_or_else(|e| {
            warn!("⚠️ Failed to read config {}: {}", path.display(), e);
            Config::default()
        })
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let mut config = load_config(&config_path, std::io::stderr);

    // Setup logging; RUST_LOG wins over both flag and config
    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🔊 TTS Tester v{} starting...", env!("CARGO_PKG_VERSION"));
    if !config_path.exists() {
        info!("💡 No config at {}, using defaults", config_path.display());
        if let Err(e) = config.save_to(&config_path) {
            warn!("⚠️ Could not write default config: {}", e);
        }
    }

    if let Some(tags_file) = args.tags_file {
        config.tags_file = tags_file.to_string_lossy().to_string();
    }

    let size = Size::new(config.window_width, config.window_height);
    let flags = AppFlags {
        config,
        engine: args.engine,
    };

    application(TesterApp::title, TesterApp::update, TesterApp::view)
        .theme(TesterApp::theme)
        .subscription(TesterApp::subscription)
        .window_size(size)
        .run_with(move || TesterApp::new(flags))
        .map_err(|e| anyhow::anyhow!("GUI error: {}", e))?;

    Ok(())
}
