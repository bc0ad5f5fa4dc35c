//! Input for first-person movement: edge-triggered key intent, pointer
//! capture with mouse look, and the host boundary both are fed through.

pub mod error;
pub mod host;
pub mod keybindings;
pub mod keyboard;
pub mod observer;
pub mod pointer_capture;
pub mod timer;

pub use error::CaptureError;
pub use host::{
    CameraHandle, CameraTransform, CaptureSurface, HeadlessSurface, HostEvent, HostEventSender,
    HostEventSource, host_channel,
};
pub use keybindings::{BINDINGS, MovementKey, controls_help, movement_key};
pub use keyboard::{ESCAPE_PULSE, KeyInputTracker, MovementIntent};
pub use observer::{ListenerId, Observers};
pub use pointer_capture::{CapturePhase, CaptureSnapshot, PointerCaptureController};
pub use timer::{Clock, ManualClock, PulseTimer, SystemClock};
