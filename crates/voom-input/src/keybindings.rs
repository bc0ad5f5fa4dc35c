//! Fixed key bindings for movement intent.
//!
//! Physical key codes are used so that WASD works identically on every
//! keyboard layout. Arrow keys are accepted as alternatives.

use winit::keyboard::KeyCode;

/// A movement intent a key can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKey {
    /// Move along the view direction.
    Forward,
    /// Move against the view direction.
    Backward,
    /// Strafe left.
    Left,
    /// Strafe right.
    Right,
    /// Run modifier.
    Run,
    /// Release gesture; produces a timed pulse rather than a held state.
    Escape,
}

/// Every recognized key and the intent it drives.
pub const BINDINGS: &[(KeyCode, MovementKey)] = &[
    (KeyCode::KeyW, MovementKey::Forward),
    (KeyCode::ArrowUp, MovementKey::Forward),
    (KeyCode::KeyS, MovementKey::Backward),
    (KeyCode::ArrowDown, MovementKey::Backward),
    (KeyCode::KeyA, MovementKey::Left),
    (KeyCode::ArrowLeft, MovementKey::Left),
    (KeyCode::KeyD, MovementKey::Right),
    (KeyCode::ArrowRight, MovementKey::Right),
    (KeyCode::ShiftLeft, MovementKey::Run),
    (KeyCode::ShiftRight, MovementKey::Run),
    (KeyCode::Escape, MovementKey::Escape),
];

/// Look up the intent bound to `code`. Unbound keys return `None`.
#[must_use]
pub fn movement_key(code: KeyCode) -> Option<MovementKey> {
    BINDINGS
        .iter()
        .find(|(bound, _)| *bound == code)
        .map(|(_, key)| *key)
}

/// One-line summary of the controls, for logs and overlays.
#[must_use]
pub fn controls_help() -> &'static str {
    "Click to capture the mouse | WASD/arrows: move | Shift: run | Mouse: look | Esc: release"
}
