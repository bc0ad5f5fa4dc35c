//! Pointer-capture lifecycle and mouse look.
//!
//! [`PointerCaptureController`] owns the exclusive-capture state machine:
//!
//! ```text
//! Unlocked --request()--> Pending --CaptureGranted--> Locked
//! Locked/Pending --CaptureReleased | CaptureError--> Unlocked
//! ```
//!
//! Transitions are host-confirmed: [`request`](PointerCaptureController::request)
//! and [`unlock`](PointerCaptureController::unlock) only ask the
//! [`CaptureSurface`]; the `on_capture_*` handlers apply the outcome.
//! While locked, raw pointer motion accumulates until the next
//! [`update_look`](PointerCaptureController::update_look).

use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Quat, Vec2, Vec3};
use tracing::{debug, error, info, trace};
use voom_config::MovementConfig;

use crate::error::CaptureError;
use crate::host::{CameraHandle, CaptureSurface};
use crate::observer::{ListenerId, Observers};

/// Where the capture state machine currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No capture; motion is discarded.
    Unlocked,
    /// Capture requested, host has not answered yet.
    Pending,
    /// Capture granted; motion accumulates.
    Locked,
}

/// Point-in-time copy of the controller's look state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSnapshot {
    pub phase: CapturePhase,
    /// Yaw in radians, within [-PI, PI].
    pub yaw: f32,
    /// Pitch in radians, within the configured limit.
    pub pitch: f32,
    pub orientation: Quat,
    pub forward: Vec3,
    pub right: Vec3,
}

/// Drives mouse look from captured pointer motion and writes the resulting
/// orientation into the host camera.
pub struct PointerCaptureController {
    camera: CameraHandle,
    surface: Box<dyn CaptureSurface>,
    phase: CapturePhase,
    /// Horizontal rotation in radians. Positive yaw turns left
    /// (counter-clockwise seen from above).
    yaw: f32,
    /// Vertical rotation in radians, clamped to ±`pitch_limit`. Positive looks up.
    pitch: f32,
    pending_delta: Vec2,
    mouse_sensitivity: f32,
    pitch_limit: f32,
    lock_listeners: Observers<bool>,
    on_escape_press: Option<Box<dyn FnMut()>>,
    last_error: Option<CaptureError>,
}

impl std::fmt::Debug for PointerCaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerCaptureController")
            .field("phase", &self.phase)
            .field("yaw", &self.yaw)
            .field("pitch", &self.pitch)
            .field("pending_delta", &self.pending_delta)
            .field("lock_listeners", &self.lock_listeners)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl PointerCaptureController {
    /// Creates an unlocked controller. Initial yaw and pitch are read from
    /// the camera's current rotation.
    pub fn new(
        camera: CameraHandle,
        surface: Box<dyn CaptureSurface>,
        config: &MovementConfig,
    ) -> Self {
        let (yaw, pitch, _roll) = camera.borrow().rotation.to_euler(EulerRot::YXZ);
        let pitch_limit = config.pitch_limit;
        Self {
            camera,
            surface,
            phase: CapturePhase::Unlocked,
            yaw,
            pitch: pitch.clamp(-pitch_limit, pitch_limit),
            pending_delta: Vec2::ZERO,
            mouse_sensitivity: config.mouse_sensitivity,
            pitch_limit,
            lock_listeners: Observers::new(),
            on_escape_press: None,
            last_error: None,
        }
    }

    // ── Capture lifecycle ───────────────────────────────────────────

    /// Ask the host for capture. Only acts when unlocked.
    pub fn request(&mut self) {
        if self.phase != CapturePhase::Unlocked {
            return;
        }
        debug!("Requesting pointer capture");
        self.phase = CapturePhase::Pending;
        self.last_error = None;
        self.surface.request_capture();
    }

    /// Ask the host to release capture. Only acts when locked; the state
    /// changes when the host confirms.
    pub fn unlock(&mut self) {
        if self.phase != CapturePhase::Locked {
            return;
        }
        debug!("Requesting pointer release");
        self.surface.release_capture();
    }

    /// Host confirmed capture.
    pub fn on_capture_granted(&mut self) {
        if self.phase == CapturePhase::Locked {
            return;
        }
        info!("Pointer captured");
        self.phase = CapturePhase::Locked;
        self.pending_delta = Vec2::ZERO;
        self.lock_listeners.notify(&true);
    }

    /// Host released capture.
    pub fn on_capture_released(&mut self) {
        if self.phase == CapturePhase::Unlocked {
            return;
        }
        info!("Pointer released");
        self.enter_unlocked();
    }

    /// Host failed to grant (or lost) capture. Logged and retained; not retried.
    pub fn on_capture_error(&mut self, reason: impl Into<String>) {
        let err = CaptureError::RequestFailed {
            reason: reason.into(),
        };
        error!("{err}");
        self.last_error = Some(err);
        if self.phase != CapturePhase::Unlocked {
            self.enter_unlocked();
        }
    }

    fn enter_unlocked(&mut self) {
        self.phase = CapturePhase::Unlocked;
        self.pending_delta = Vec2::ZERO;
        self.lock_listeners.notify(&false);
    }

    /// Escape was pressed. While locked this invokes the release-request
    /// callback, if one is set.
    pub fn handle_escape_key(&mut self) {
        if self.phase != CapturePhase::Locked {
            return;
        }
        if let Some(callback) = self.on_escape_press.as_mut() {
            callback();
        }
    }

    /// Set the callback run by [`handle_escape_key`](Self::handle_escape_key).
    pub fn set_on_escape_press(&mut self, callback: impl FnMut() + 'static) {
        self.on_escape_press = Some(Box::new(callback));
    }

    /// Register a lock-change observer (`true` on capture, `false` on release).
    pub fn add_lock_listener(&mut self, listener: impl FnMut(&bool) + 'static) -> ListenerId {
        self.lock_listeners.add(listener)
    }

    /// Unregister a lock-change observer.
    pub fn remove_lock_listener(&mut self, id: ListenerId) -> bool {
        self.lock_listeners.remove(id)
    }

    // ── Mouse look ──────────────────────────────────────────────────

    /// Accumulate raw pointer motion. Discarded unless locked.
    pub fn on_pointer_motion(&mut self, dx: f32, dy: f32) {
        if self.phase != CapturePhase::Locked {
            return;
        }
        self.pending_delta += Vec2::new(dx, dy);
    }

    /// Consume the accumulated motion: update yaw/pitch, write the new
    /// orientation to the camera and zero the accumulator.
    ///
    /// Returns `false` (and changes nothing) when unlocked or when there is
    /// no accumulated motion.
    pub fn update_look(&mut self) -> bool {
        if self.phase != CapturePhase::Locked || self.pending_delta == Vec2::ZERO {
            return false;
        }
        let delta = self.pending_delta * self.mouse_sensitivity;
        self.yaw = wrap_angle(self.yaw - delta.x);
        self.pitch = (self.pitch - delta.y).clamp(-self.pitch_limit, self.pitch_limit);
        self.pending_delta = Vec2::ZERO;

        let rotation = self.orientation();
        self.camera.borrow_mut().rotation = rotation;
        trace!(yaw = self.yaw, pitch = self.pitch, "look updated");
        true
    }

    /// Orientation from yaw about world up, then pitch about the local right axis.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Horizontal unit vector the camera faces. Zero if degenerate.
    #[must_use]
    pub fn forward_vector(&self) -> Vec3 {
        horizontal(self.orientation() * Vec3::NEG_Z)
    }

    /// Horizontal unit vector to the camera's right. Zero if degenerate.
    #[must_use]
    pub fn right_vector(&self) -> Vec3 {
        horizontal(self.orientation() * Vec3::X)
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Current phase of the capture state machine.
    #[must_use]
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Whether capture is currently held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.phase == CapturePhase::Locked
    }

    /// Motion accumulated since the last look update.
    #[must_use]
    pub fn pending_delta(&self) -> Vec2 {
        self.pending_delta
    }

    /// Current yaw in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current pitch in radians.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Copy of the current phase and orientation.
    #[must_use]
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            phase: self.phase,
            yaw: self.yaw,
            pitch: self.pitch,
            orientation: self.orientation(),
            forward: self.forward_vector(),
            right: self.right_vector(),
        }
    }

    /// The most recent capture failure, cleared by the next [`request`](Self::request).
    #[must_use]
    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    /// Release capture if held and drop every observer and callback.
    pub fn dispose(&mut self) {
        self.unlock();
        self.lock_listeners.clear();
        self.on_escape_press = None;
    }
}

/// Bring an angle back into [-PI, PI]. Values already in range are returned
/// unchanged.
fn wrap_angle(angle: f32) -> f32 {
    if (-PI..=PI).contains(&angle) {
        angle
    } else {
        (angle + PI).rem_euclid(TAU) - PI
    }
}

/// Drop the vertical component and re-normalize.
fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}
