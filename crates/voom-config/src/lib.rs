//! Configuration system for Voom.
//!
//! Movement constants, window and debug settings persisted to disk as RON,
//! with CLI overrides via clap and hot-reload detection.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, Config, DebugConfig, MovementConfig, WindowConfig};
pub use error::ConfigError;
