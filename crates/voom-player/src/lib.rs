//! First-person player movement: kinematics and the system that ties key
//! intent, pointer capture, and integration to a host camera.

pub mod error;
pub mod kinematics;
pub mod movement_system;

pub use error::MovementError;
pub use kinematics::{KinematicIntegrator, MOVING_THRESHOLD, PlayerState, STOP_SPEED};
pub use movement_system::{MovementSystem, MovementSystemBuilder};
