//! Configuration structs with sensible defaults and RON persistence.

use std::f32::consts::FRAC_PI_3;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Movement and mouse-look tuning.
    pub movement: MovementConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Window title.
    pub title: String,
}

/// Movement constants shared by the key tracker, the capture controller and
/// the kinematic integrator.
///
/// The struct is `Copy`: every subsystem receives its own copy at
/// construction and never mutates it afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed in world units per second.
    pub walk_speed: f32,
    /// Multiplier applied to `walk_speed` while the run modifier is held.
    pub run_multiplier: f32,
    /// Radians of rotation per unit of raw pointer motion.
    pub mouse_sensitivity: f32,
    /// Maximum look angle above or below the horizon, in radians.
    pub pitch_limit: f32,
    /// Velocity decay rate (per second) when there is no movement intent.
    pub friction: f32,
    /// Approach rate (per second) toward the desired velocity.
    pub acceleration: f32,
    /// Fixed vertical position of the eye.
    pub eye_height: f32,
    /// Per-axis factor of a normalized diagonal (1/sqrt(2)).
    pub diagonal_factor: f32,
}

impl MovementConfig {
    /// Target speed while running.
    #[must_use]
    pub fn run_speed(&self) -> f32 {
        self.walk_speed * self.run_multiplier
    }

    /// Default spawn point: the origin at eye height.
    #[must_use]
    pub fn spawn_position(&self) -> [f32; 3] {
        [0.0, self.eye_height, 0.0]
    }

    /// Reject negative or non-finite constants.
    ///
    /// `eye_height` may be negative (a floor below the origin) but must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("walk_speed", self.walk_speed),
            ("run_multiplier", self.run_multiplier),
            ("mouse_sensitivity", self.mouse_sensitivity),
            ("pitch_limit", self.pitch_limit),
            ("friction", self.friction),
            ("acceleration", self.acceleration),
            ("diagonal_factor", self.diagonal_factor),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        if !self.eye_height.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "eye_height",
                value: self.eye_height,
            });
        }
        Ok(())
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Write the player position into the window title every frame.
    pub show_position: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            title: "Voom".to_string(),
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 320.0,
            run_multiplier: 1.4,
            mouse_sensitivity: 0.002,
            pitch_limit: FRAC_PI_3,
            friction: 10.0,
            acceleration: 20.0,
            eye_height: 41.0,
            diagonal_factor: 0.707,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_position: true,
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.movement.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.movement.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
