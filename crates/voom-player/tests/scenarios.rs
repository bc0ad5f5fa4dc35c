//! End-to-end movement scenarios driven through the host event channel.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use voom_config::MovementConfig;
use voom_input::{
    CameraHandle, CameraTransform, HeadlessSurface, HostEvent, HostEventSender, host_channel,
};
use voom_player::MovementSystem;
use winit::keyboard::KeyCode;

const FRAME_MS: f32 = 16.0;

struct Harness {
    system: MovementSystem,
    camera: CameraHandle,
    host: HostEventSender,
    surface: HeadlessSurface,
}

impl Harness {
    fn new() -> Self {
        let (host, source) = host_channel();
        let surface = HeadlessSurface::confirming(host.clone());
        let camera = CameraTransform::default().into_handle();
        let system = MovementSystem::builder()
            .camera(camera.clone())
            .surface(surface.clone())
            .config(MovementConfig::default())
            .events(source)
            .build()
            .unwrap();
        Self {
            system,
            camera,
            host,
            surface,
        }
    }

    fn captured() -> Self {
        let mut harness = Self::new();
        harness.system.enable();
        harness.system.pump_events();
        assert!(harness.system.is_active());
        harness
    }

    fn send(&mut self, event: HostEvent) {
        assert!(self.host.send(event));
        self.system.pump_events();
    }

    fn frames(&mut self, n: usize) {
        for _ in 0..n {
            self.system.pump_events();
            self.system.update(FRAME_MS);
        }
    }

    fn position(&self) -> Vec3 {
        self.camera.borrow().position
    }
}

#[test]
fn forward_walk_reaches_walk_speed() {
    let mut h = Harness::captured();
    h.send(HostEvent::KeyDown(KeyCode::KeyW));

    let mut last_z = h.position().z;
    for _ in 0..50 {
        h.frames(1);
        let pos = h.position();
        assert!(pos.z < last_z);
        assert_eq!(pos.y, 41.0);
        assert!(pos.x.abs() < 1e-4);
        last_z = pos.z;
    }
    assert!((h.system.integrator().speed() - 320.0).abs() < 1e-2);
}

#[test]
fn diagonal_is_not_faster_than_straight() {
    let mut h = Harness::captured();
    h.send(HostEvent::KeyDown(KeyCode::KeyW));
    h.send(HostEvent::KeyDown(KeyCode::KeyA));
    h.frames(200);

    let state = h.system.player_state();
    assert!((state.velocity.length() - 320.0).abs() < 1e-2);
    assert!(state.velocity.x < 0.0);
    assert!(state.velocity.z < 0.0);
}

#[test]
fn shift_runs_and_release_walks() {
    let mut h = Harness::captured();
    h.send(HostEvent::KeyDown(KeyCode::ArrowUp));
    h.send(HostEvent::KeyDown(KeyCode::ShiftRight));
    h.frames(200);
    assert!((h.system.integrator().speed() - 448.0).abs() < 1e-2);
    assert!(h.system.player_state().is_running);

    h.send(HostEvent::KeyUp(KeyCode::ShiftRight));
    h.frames(200);
    assert!((h.system.integrator().speed() - 320.0).abs() < 1e-2);
    assert!(!h.system.player_state().is_running);
}

#[test]
fn releasing_keys_coasts_to_a_stop() {
    let mut h = Harness::captured();
    h.send(HostEvent::KeyDown(KeyCode::KeyS));
    h.frames(60);
    h.send(HostEvent::KeyUp(KeyCode::KeyS));

    let mut previous = h.system.integrator().speed();
    for _ in 0..100 {
        h.frames(1);
        let speed = h.system.integrator().speed();
        assert!(speed <= previous);
        previous = speed;
    }
    assert_eq!(h.system.player_state().velocity, Vec3::ZERO);
    assert!(!h.system.player_state().is_moving);

    let resting = h.position();
    h.frames(10);
    assert_eq!(h.position(), resting);
}

#[test]
fn extreme_frame_times_stay_finite() {
    let mut h = Harness::captured();
    h.send(HostEvent::KeyDown(KeyCode::KeyD));
    for dt in [0.0, 1.0e7, f32::NAN, -16.0, f32::INFINITY, FRAME_MS] {
        h.system.update(dt);
        assert!(h.position().is_finite(), "dt={dt}");
    }

    let before = h.position();
    h.system.update(0.0);
    assert_eq!(h.position(), before);
}

#[test]
fn turning_changes_walk_direction() {
    let mut h = Harness::captured();
    let sensitivity = MovementConfig::default().mouse_sensitivity;
    // Quarter turn to the right: forward becomes +X.
    h.send(HostEvent::PointerMotion {
        dx: FRAC_PI_2 / sensitivity,
        dy: 0.0,
    });
    h.send(HostEvent::KeyDown(KeyCode::KeyW));
    h.frames(100);

    let velocity = h.system.player_state().velocity;
    assert!(velocity.x > 319.0);
    assert!(velocity.z.abs() < 1.0);
}

#[test]
fn looking_down_does_not_slow_walking() {
    let mut h = Harness::captured();
    h.send(HostEvent::PointerMotion {
        dx: 0.0,
        dy: 10_000.0,
    });
    h.send(HostEvent::KeyDown(KeyCode::KeyW));
    h.frames(200);

    let limit = MovementConfig::default().pitch_limit;
    assert!((h.system.capture().pitch + limit).abs() < 1e-6);
    assert!((h.system.integrator().speed() - 320.0).abs() < 1e-2);
    assert_eq!(h.position().y, 41.0);
}

#[test]
fn motion_while_released_is_discarded() {
    let mut h = Harness::new();
    h.send(HostEvent::PointerMotion {
        dx: 500.0,
        dy: 500.0,
    });
    h.system.enable();
    h.system.pump_events();
    h.frames(1);

    assert_eq!(h.system.capture().yaw, 0.0);
    assert_eq!(h.system.capture().pitch, 0.0);
    assert_eq!(h.camera.borrow().rotation, glam::Quat::IDENTITY);
}

#[test]
fn escape_round_trip_releases_and_recaptures() {
    let mut h = Harness::captured();
    h.send(HostEvent::KeyDown(KeyCode::KeyW));
    h.frames(5);

    // The confirming surface answers the release within the same pump.
    h.send(HostEvent::KeyDown(KeyCode::Escape));
    assert_eq!(h.surface.releases(), 1);
    assert!(!h.system.is_active());
    assert!(!h.system.is_pointer_locked());
    assert!(!h.system.intent().forward);

    let frozen = h.position();
    h.send(HostEvent::KeyUp(KeyCode::Escape));
    h.frames(10);
    assert_eq!(h.position(), frozen);

    // Keys held through the release must be pressed again.
    h.system.enable();
    h.system.pump_events();
    assert!(h.system.is_active());
    assert_eq!(h.surface.requests(), 2);
    h.send(HostEvent::KeyDown(KeyCode::KeyW));
    assert!(h.system.intent().forward);
}

#[test]
fn host_denial_leaves_system_inactive() {
    let (host, source) = host_channel();
    let camera = CameraTransform::default().into_handle();
    let mut system = MovementSystem::builder()
        .camera(camera)
        .surface(HeadlessSurface::new())
        .events(source)
        .build()
        .unwrap();

    system.enable();
    host.send(HostEvent::CaptureError("not allowed".to_string()));
    system.pump_events();
    assert!(!system.is_active());
    assert!(system.last_capture_error().is_some());

    system.enable();
    host.send(HostEvent::CaptureGranted);
    system.pump_events();
    assert!(system.is_active());
}
