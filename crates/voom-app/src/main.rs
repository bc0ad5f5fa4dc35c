//! The Voom binary: a window with first-person movement.
//!
//! Run with: `cargo run -p voom-app -- --sensitivity 0.003`

use clap::Parser;
use tracing::{error, info};
use voom_app::PlatformDirs;
use voom_config::{CliArgs, Config};

fn main() {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(dir) => PlatformDirs::with_config_dir(dir.clone()),
        None => PlatformDirs::resolve().unwrap_or_else(|e| {
            eprintln!("{e}, using the working directory");
            PlatformDirs::resolve_with_root(std::path::Path::new("."))
        }),
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
    }

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    voom_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!("Voom starting");
    info!("  config: {}", dirs.config_dir.display());
    info!("  logs:   {}", dirs.log_dir.display());

    if let Err(e) = voom_app::run(config) {
        error!("{e}");
        std::process::exit(1);
    }
}
