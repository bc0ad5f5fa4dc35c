//! Command-line flags layered over `config.ron`.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Flags accepted by the `voom` binary. Anything left unset keeps the value
/// from the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "voom", version, about = "First-person movement sandbox")]
pub struct CliArgs {
    /// Directory holding `config.ron` and the log directory.
    #[arg(long, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `voom_input=trace`.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[arg(long, help_heading = "Window")]
    pub width: Option<u32>,

    #[arg(long, help_heading = "Window")]
    pub height: Option<u32>,

    /// Borderless fullscreen on the current monitor.
    #[arg(long, help_heading = "Window")]
    pub fullscreen: bool,

    /// Radians of turn per unit of raw pointer motion.
    #[arg(long, help_heading = "Movement")]
    pub sensitivity: Option<f32>,

    /// Units per second at walking pace.
    #[arg(long, help_heading = "Movement")]
    pub walk_speed: Option<f32>,

    /// Factor applied to walk speed while Shift is held.
    #[arg(long, help_heading = "Movement")]
    pub run_multiplier: Option<f32>,
}

impl Config {
    /// Overwrite every setting the command line supplied.
    ///
    /// The result is not validated here; movement values are checked when
    /// the movement system is built.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let window = &mut self.window;
        window.width = args.width.unwrap_or(window.width);
        window.height = args.height.unwrap_or(window.height);
        window.fullscreen |= args.fullscreen;

        let movement = &mut self.movement;
        movement.mouse_sensitivity = args.sensitivity.unwrap_or(movement.mouse_sensitivity);
        movement.walk_speed = args.walk_speed.unwrap_or(movement.walk_speed);
        movement.run_multiplier = args.run_multiplier.unwrap_or(movement.run_multiplier);

        if let Some(level) = &args.log_level {
            self.debug.log_level.clone_from(level);
        }
    }
}
