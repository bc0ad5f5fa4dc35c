//! The movement system: the single object an application holds to get
//! first-person movement on a host camera.
//!
//! It owns a [`KeyInputTracker`], a [`PointerCaptureController`] and a
//! [`KinematicIntegrator`] and wires them so that:
//!
//! - gaining pointer capture enables key tracking and activates movement,
//! - losing it disables key tracking and deactivates movement,
//! - an Escape pulse asks the host to release capture.
//!
//! Host events arrive either through [`MovementSystem::handle_event`] or by
//! draining a subscribed [`HostEventSource`] with
//! [`MovementSystem::pump_events`]. Call [`MovementSystem::update`] once per
//! frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec3;
use tracing::{debug, info, warn};
use voom_config::MovementConfig;
use voom_input::{
    CameraHandle, CaptureError, CaptureSnapshot, CaptureSurface, Clock, HostEvent, HostEventSource,
    KeyInputTracker, ListenerId, MovementIntent, MovementKey, PointerCaptureController,
    movement_key,
};

use crate::error::MovementError;
use crate::kinematics::{KinematicIntegrator, PlayerState};

/// Assembles a [`MovementSystem`] from host handles and tuning.
#[derive(Default)]
pub struct MovementSystemBuilder {
    camera: Option<CameraHandle>,
    surface: Option<Box<dyn CaptureSurface>>,
    config: MovementConfig,
    spawn: Option<Vec3>,
    clock: Option<Box<dyn Clock>>,
    events: Option<HostEventSource>,
}

impl MovementSystemBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera the system writes position and orientation into. Required.
    #[must_use]
    pub fn camera(mut self, camera: CameraHandle) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Surface used to request and release pointer capture. Required.
    #[must_use]
    pub fn surface(mut self, surface: impl CaptureSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    #[must_use]
    pub fn config(mut self, config: MovementConfig) -> Self {
        self.config = config;
        self
    }

    /// Starting position. Defaults to the camera's current position.
    #[must_use]
    pub fn spawn(mut self, position: Vec3) -> Self {
        self.spawn = Some(position);
        self
    }

    /// Clock timing the escape pulse. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Subscribe to a host event source at construction.
    #[must_use]
    pub fn events(mut self, source: HostEventSource) -> Self {
        self.events = Some(source);
        self
    }

    /// Validate the tuning and wire the components together.
    pub fn build(self) -> Result<MovementSystem, MovementError> {
        self.config.validate()?;
        let camera = self
            .camera
            .ok_or(MovementError::MissingHostHandle("camera"))?;
        let surface = self
            .surface
            .ok_or(MovementError::MissingHostHandle("capture surface"))?;

        let spawn = self.spawn.unwrap_or_else(|| camera.borrow().position);
        let tracker = match self.clock {
            Some(clock) => KeyInputTracker::with_clock(clock),
            None => KeyInputTracker::new(),
        };
        let capture = PointerCaptureController::new(Rc::clone(&camera), surface, &self.config);

        let system = MovementSystem {
            tracker: Rc::new(RefCell::new(tracker)),
            capture: Rc::new(RefCell::new(capture)),
            integrator: KinematicIntegrator::new(self.config, Some(spawn)),
            camera,
            active: Rc::new(Cell::new(false)),
            events: self.events,
            disposed: false,
        };
        system.wire();
        info!(
            walk_speed = self.config.walk_speed,
            sensitivity = self.config.mouse_sensitivity,
            "Movement system ready"
        );
        Ok(system)
    }
}

/// First-person movement bound to a host camera and capture surface.
///
/// Inactive until the host confirms pointer capture. While inactive,
/// [`update`](Self::update) leaves the camera untouched.
pub struct MovementSystem {
    tracker: Rc<RefCell<KeyInputTracker>>,
    capture: Rc<RefCell<PointerCaptureController>>,
    integrator: KinematicIntegrator,
    camera: CameraHandle,
    active: Rc<Cell<bool>>,
    events: Option<HostEventSource>,
    disposed: bool,
}

impl std::fmt::Debug for MovementSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementSystem")
            .field("active", &self.active.get())
            .field("integrator", &self.integrator)
            .field("subscribed", &self.events.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl MovementSystem {
    /// Start building a system.
    #[must_use]
    pub fn builder() -> MovementSystemBuilder {
        MovementSystemBuilder::new()
    }

    fn wire(&self) {
        let tracker = Rc::downgrade(&self.tracker);
        let active = Rc::clone(&self.active);
        self.capture
            .borrow_mut()
            .add_lock_listener(move |&locked| {
                if let Some(tracker) = tracker.upgrade() {
                    let mut tracker = tracker.borrow_mut();
                    if locked {
                        tracker.enable();
                    } else {
                        tracker.disable();
                    }
                }
                active.set(locked);
                info!(locked, "Movement {}", if locked { "active" } else { "paused" });
            });

        let capture = Rc::downgrade(&self.capture);
        self.tracker.borrow_mut().add_listener(move |intent| {
            if !intent.escape_pulse {
                return;
            }
            let Some(capture) = capture.upgrade() else {
                return;
            };
            match capture.try_borrow_mut() {
                Ok(mut capture) => capture.unlock(),
                Err(_) => warn!("Escape pulse during capture update, release skipped"),
            };
        });
    }

    /// Route one host event to the component that owns it.
    pub fn handle_event(&mut self, event: &HostEvent) {
        if self.disposed {
            return;
        }
        match event {
            HostEvent::KeyDown(code) => {
                self.tracker.borrow_mut().handle_key_down(*code);
                if movement_key(*code) == Some(MovementKey::Escape) {
                    self.capture.borrow_mut().handle_escape_key();
                }
            }
            HostEvent::KeyUp(code) => self.tracker.borrow_mut().handle_key_up(*code),
            HostEvent::PointerMotion { dx, dy } => {
                self.capture.borrow_mut().on_pointer_motion(*dx, *dy);
            }
            HostEvent::CaptureGranted => self.capture.borrow_mut().on_capture_granted(),
            HostEvent::CaptureReleased => self.capture.borrow_mut().on_capture_released(),
            HostEvent::CaptureError(reason) => {
                self.capture.borrow_mut().on_capture_error(reason.clone());
            }
        }
    }

    /// Drain host events from `source` on every [`pump_events`](Self::pump_events).
    /// Replaces any previous subscription.
    pub fn subscribe(&mut self, source: HostEventSource) {
        if self.events.replace(source).is_some() {
            debug!("Replaced host event subscription");
        }
    }

    /// Release the current subscription, if any.
    pub fn unsubscribe(&mut self) -> Option<HostEventSource> {
        self.events.take()
    }

    /// Handle every queued host event, including any the handlers queue
    /// themselves. Returns the number handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.as_ref().and_then(HostEventSource::try_next) {
            self.handle_event(&event);
            handled += 1;
            if self.disposed {
                break;
            }
        }
        handled
    }

    /// Per-frame tick. `dt_ms` is the elapsed time in milliseconds;
    /// non-finite or negative values count as zero.
    pub fn update(&mut self, dt_ms: f32) {
        if self.disposed {
            return;
        }
        self.tracker.borrow_mut().poll();
        if !self.active.get() {
            return;
        }

        self.capture.borrow_mut().update_look();
        let intent = self.tracker.borrow().state();
        let (forward, right) = {
            let capture = self.capture.borrow();
            (capture.forward_vector(), capture.right_vector())
        };
        self.integrator.update(dt_ms / 1000.0, &intent, forward, right);
        self.camera.borrow_mut().position = self.integrator.position();
    }

    /// Ask the host for pointer capture. Movement starts once it is granted.
    pub fn enable(&mut self) {
        if !self.disposed {
            self.capture.borrow_mut().request();
        }
    }

    /// Ask the host to release pointer capture.
    pub fn disable(&mut self) {
        if !self.disposed {
            self.capture.borrow_mut().unlock();
        }
    }

    /// Whether capture is held and movement runs on update.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    #[must_use]
    pub fn is_pointer_locked(&self) -> bool {
        self.capture.borrow().is_locked()
    }

    #[must_use]
    pub fn player_state(&self) -> PlayerState {
        self.integrator.state()
    }

    /// Current movement intent.
    #[must_use]
    pub fn intent(&self) -> MovementIntent {
        self.tracker.borrow().state()
    }

    /// Capture phase and look orientation as of now.
    #[must_use]
    pub fn capture(&self) -> CaptureSnapshot {
        self.capture.borrow().snapshot()
    }

    #[must_use]
    pub fn integrator(&self) -> &KinematicIntegrator {
        &self.integrator
    }

    /// Failure reported by the last capture attempt, if any.
    #[must_use]
    pub fn last_capture_error(&self) -> Option<CaptureError> {
        self.capture.borrow().last_error().cloned()
    }

    /// Teleport the player and the camera.
    pub fn set_position(&mut self, position: Vec3) {
        self.integrator.set_position(position);
        self.camera.borrow_mut().position = self.integrator.position();
    }

    /// Observe capture changes (`true` once locked, `false` once released).
    pub fn add_lock_listener(&mut self, listener: impl FnMut(&bool) + 'static) -> ListenerId {
        self.capture.borrow_mut().add_lock_listener(listener)
    }

    /// Callback run when Escape is pressed while capture is held.
    pub fn set_on_escape_press(&mut self, callback: impl FnMut() + 'static) {
        self.capture.borrow_mut().set_on_escape_press(callback);
    }

    /// Clear intent, return the player to the origin, and ask for capture
    /// to be released.
    pub fn reset(&mut self) {
        self.tracker.borrow_mut().reset();
        self.integrator.reset(None);
        self.capture.borrow_mut().unlock();
        self.active.set(false);
    }

    /// Tear down. Listeners are dropped, capture release is requested, and
    /// the host subscription is released. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.tracker.borrow_mut().dispose();
        self.capture.borrow_mut().dispose();
        self.integrator.reset(None);
        self.active.set(false);
        self.events = None;
        self.disposed = true;
        debug!("Movement system disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use voom_input::{CameraTransform, HeadlessSurface, ManualClock, host_channel};
    use winit::keyboard::KeyCode;

    fn system_with(surface: HeadlessSurface) -> (MovementSystem, CameraHandle) {
        let camera = CameraTransform::default().into_handle();
        let system = MovementSystem::builder()
            .camera(Rc::clone(&camera))
            .surface(surface)
            .build()
            .unwrap();
        (system, camera)
    }

    fn locked_system() -> (MovementSystem, CameraHandle) {
        let (mut system, camera) = system_with(HeadlessSurface::new());
        system.enable();
        system.handle_event(&HostEvent::CaptureGranted);
        (system, camera)
    }

    #[test]
    fn test_missing_handles_rejected() {
        let err = MovementSystem::builder()
            .surface(HeadlessSurface::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, MovementError::MissingHostHandle("camera")));

        let err = MovementSystem::builder()
            .camera(CameraTransform::default().into_handle())
            .build()
            .unwrap_err();
        assert!(matches!(err, MovementError::MissingHostHandle("capture surface")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MovementConfig {
            walk_speed: f32::NAN,
            ..MovementConfig::default()
        };
        let err = MovementSystem::builder()
            .camera(CameraTransform::default().into_handle())
            .surface(HeadlessSurface::new())
            .config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, MovementError::Config(_)));
    }

    #[test]
    fn test_spawn_defaults_to_camera_position() {
        let camera = CameraTransform {
            position: Vec3::new(3.0, 0.0, -4.0),
            ..CameraTransform::default()
        }
        .into_handle();
        let system = MovementSystem::builder()
            .camera(camera)
            .surface(HeadlessSurface::new())
            .build()
            .unwrap();
        assert_eq!(system.player_state().position, Vec3::new(3.0, 41.0, -4.0));
    }

    #[test]
    fn test_inactive_until_capture_granted() {
        let surface = HeadlessSurface::new();
        let (mut system, camera) = system_with(surface.clone());
        assert!(!system.is_active());

        system.enable();
        assert_eq!(surface.requests(), 1);
        assert!(!system.is_active());

        system.handle_event(&HostEvent::KeyDown(KeyCode::KeyW));
        system.update(16.0);
        assert_eq!(camera.borrow().position, Vec3::ZERO);
        assert!(!system.intent().forward);

        system.handle_event(&HostEvent::CaptureGranted);
        assert!(system.is_active());
        assert!(system.is_pointer_locked());
    }

    #[test]
    fn test_update_writes_camera_position_and_rotation() {
        let (mut system, camera) = locked_system();
        system.handle_event(&HostEvent::KeyDown(KeyCode::KeyW));
        system.handle_event(&HostEvent::PointerMotion { dx: 100.0, dy: 0.0 });
        system.update(16.0);

        let cam = *camera.borrow();
        assert_eq!(cam.position, system.player_state().position);
        assert_eq!(cam.position.y, 41.0);
        assert_ne!(cam.rotation, glam::Quat::IDENTITY);
        assert!(system.player_state().is_moving);
    }

    #[test]
    fn test_release_disables_tracking_and_clears_intent() {
        let (mut system, _camera) = locked_system();
        system.handle_event(&HostEvent::KeyDown(KeyCode::KeyW));
        assert!(system.intent().forward);

        system.handle_event(&HostEvent::CaptureReleased);
        assert!(!system.is_active());
        assert_eq!(system.intent(), MovementIntent::default());
    }

    #[test]
    fn test_escape_requests_release_and_runs_callback() {
        let surface = HeadlessSurface::new();
        let (mut system, _camera) = system_with(surface.clone());
        system.enable();
        system.handle_event(&HostEvent::CaptureGranted);

        let pressed = Rc::new(Cell::new(0));
        let seen = Rc::clone(&pressed);
        system.set_on_escape_press(move || seen.set(seen.get() + 1));

        system.handle_event(&HostEvent::KeyDown(KeyCode::Escape));
        assert_eq!(surface.releases(), 1);
        assert_eq!(pressed.get(), 1);
        // Still locked until the host confirms.
        assert!(system.is_active());

        system.handle_event(&HostEvent::CaptureReleased);
        assert!(!system.is_active());
    }

    #[test]
    fn test_escape_pulse_clears_on_update() {
        let clock = ManualClock::new();
        let camera = CameraTransform::default().into_handle();
        let mut system = MovementSystem::builder()
            .camera(camera)
            .surface(HeadlessSurface::new())
            .clock(clock.clone())
            .build()
            .unwrap();

        system.handle_event(&HostEvent::KeyDown(KeyCode::Escape));
        assert!(system.intent().escape_pulse);
        clock.advance(Duration::from_millis(50));
        system.update(16.0);
        assert!(system.intent().escape_pulse);
        clock.advance(Duration::from_millis(60));
        system.update(16.0);
        assert!(!system.intent().escape_pulse);
    }

    #[test]
    fn test_pump_events_drains_subscription() {
        let (tx, rx) = host_channel();
        let surface = HeadlessSurface::confirming(tx.clone());
        let (mut system, _camera) = system_with(surface);
        system.subscribe(rx);

        system.enable();
        tx.send(HostEvent::KeyDown(KeyCode::KeyD));
        assert_eq!(system.pump_events(), 2);
        assert!(system.is_active());
        assert!(system.intent().right);
        assert_eq!(system.pump_events(), 0);

        assert!(system.unsubscribe().is_some());
        tx.send(HostEvent::KeyUp(KeyCode::KeyD));
        assert_eq!(system.pump_events(), 0);
        assert!(system.intent().right);
    }

    #[test]
    fn test_capture_error_recorded() {
        let (mut system, _camera) = system_with(HeadlessSurface::new());
        system.enable();
        system.handle_event(&HostEvent::CaptureError("denied".to_string()));
        assert!(!system.is_active());
        assert_eq!(
            system.last_capture_error(),
            Some(CaptureError::RequestFailed {
                reason: "denied".to_string()
            })
        );
    }

    #[test]
    fn test_reset_returns_to_origin_and_requests_release() {
        let surface = HeadlessSurface::new();
        let (mut system, _camera) = system_with(surface.clone());
        system.enable();
        system.handle_event(&HostEvent::CaptureGranted);
        system.handle_event(&HostEvent::KeyDown(KeyCode::KeyW));
        for _ in 0..10 {
            system.update(16.0);
        }

        system.reset();
        assert!(!system.is_active());
        assert_eq!(surface.releases(), 1);
        assert_eq!(system.intent(), MovementIntent::default());
        assert_eq!(system.player_state().position, Vec3::new(0.0, 41.0, 0.0));
        assert_eq!(system.player_state().velocity, Vec3::ZERO);
    }

    #[test]
    fn test_dispose_ignores_further_events() {
        let (tx, rx) = host_channel();
        let (mut system, camera) = system_with(HeadlessSurface::new());
        system.subscribe(rx);
        system.enable();
        system.handle_event(&HostEvent::CaptureGranted);

        system.dispose();
        assert!(system.is_disposed());
        assert!(!tx.send(HostEvent::KeyDown(KeyCode::KeyW)));

        system.handle_event(&HostEvent::CaptureGranted);
        system.handle_event(&HostEvent::KeyDown(KeyCode::KeyW));
        system.update(16.0);
        assert!(!system.intent().forward);
        assert_eq!(camera.borrow().position, Vec3::ZERO);

        system.dispose();
    }

    #[test]
    fn test_lock_listener_passthrough() {
        let (mut system, _camera) = system_with(HeadlessSurface::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        system.add_lock_listener(move |locked| log.borrow_mut().push(*locked));

        system.enable();
        system.handle_event(&HostEvent::CaptureGranted);
        system.handle_event(&HostEvent::CaptureReleased);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn test_capture_snapshot_outlives_later_events() {
        let (mut system, _camera) = locked_system();
        let before = system.capture();
        system.handle_event(&HostEvent::PointerMotion { dx: 50.0, dy: 0.0 });
        system.update(16.0);
        system.handle_event(&HostEvent::CaptureReleased);

        let after = system.capture();
        assert_eq!(before.phase, voom_input::CapturePhase::Locked);
        assert_eq!(after.phase, voom_input::CapturePhase::Unlocked);
        assert!(after.yaw < before.yaw);
    }

    #[test]
    fn test_set_position_moves_camera() {
        let (mut system, camera) = system_with(HeadlessSurface::new());
        system.set_position(Vec3::new(8.0, 0.0, 8.0));
        assert_eq!(camera.borrow().position, Vec3::new(8.0, 41.0, 8.0));
    }
}
