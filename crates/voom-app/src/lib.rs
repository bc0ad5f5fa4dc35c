//! Voom host application.
//!
//! Opens a window, feeds its input into a [`voom_player::MovementSystem`],
//! and drives the system once per redraw.

pub mod frame_clock;
pub mod platform;
pub mod window;

pub use frame_clock::{FrameClock, MAX_FRAME_TIME};
pub use platform::{PlatformDirs, PlatformError};
pub use window::{AppError, VoomApp, WinitCaptureSurface, run};
