//! Window creation and event handling via winit.
//!
//! [`VoomApp`] implements winit's [`ApplicationHandler`]: it translates window
//! and device events into [`HostEvent`]s, owns the [`MovementSystem`], and
//! ticks it on every redraw.

use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use tracing::{error, info, instrument, warn};
use voom_config::Config;
use voom_input::{
    CameraHandle, CameraTransform, CaptureSurface, HostEvent, HostEventSender, HostEventSource,
    controls_help, host_channel,
};
use voom_player::{MovementError, MovementSystem, PlayerState};
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowAttributes, WindowId};

/// Failures that stop the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] OsError),
    #[error(transparent)]
    Movement(#[from] MovementError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .with_fullscreen(
            config
                .window
                .fullscreen
                .then_some(Fullscreen::Borderless(None)),
        )
}

/// Window title with the player position appended.
pub fn position_title(base: &str, state: &PlayerState) -> String {
    let p = state.position;
    let gait = if state.is_running { " [run]" } else { "" };
    format!("{base} | x: {:.1} z: {:.1}{gait}", p.x, p.z)
}

/// Pointer capture backed by cursor grabbing on a winit window.
///
/// Outcomes are reported on the host channel, so the movement system sees
/// them on its next pump.
pub struct WinitCaptureSurface {
    window: Arc<Window>,
    events: HostEventSender,
}

impl WinitCaptureSurface {
    pub fn new(window: Arc<Window>, events: HostEventSender) -> Self {
        Self { window, events }
    }
}

impl CaptureSurface for WinitCaptureSurface {
    fn request_capture(&mut self) {
        // Not every platform supports Locked; Confined still keeps the cursor
        // inside and raw motion keeps flowing.
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                self.events.send(HostEvent::CaptureGranted);
            }
            Err(e) => {
                self.events.send(HostEvent::CaptureError(e.to_string()));
            }
        }
    }

    fn release_capture(&mut self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            warn!("Cursor ungrab failed: {e}");
        }
        self.window.set_cursor_visible(true);
        self.events.send(HostEvent::CaptureReleased);
    }
}

/// Application state: the window, the camera, and the movement system.
pub struct VoomApp {
    config: Config,
    window: Option<Arc<Window>>,
    camera: CameraHandle,
    movement: Option<MovementSystem>,
    host: HostEventSender,
    source: Option<HostEventSource>,
    frame_clock: crate::FrameClock,
    failure: Option<AppError>,
}

impl VoomApp {
    pub fn new(config: Config) -> Self {
        let (host, source) = host_channel();
        let camera = CameraTransform {
            position: Vec3::from_array(config.movement.spawn_position()),
            ..CameraTransform::default()
        }
        .into_handle();
        Self {
            config,
            window: None,
            camera,
            movement: None,
            host,
            source: Some(source),
            frame_clock: crate::FrameClock::new(),
            failure: None,
        }
    }

    /// Current camera transform.
    pub fn camera(&self) -> CameraTransform {
        *self.camera.borrow()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn start(&mut self, window: Arc<Window>) -> Result<(), AppError> {
        let Some(source) = self.source.take() else {
            return Ok(());
        };
        let surface = WinitCaptureSurface::new(Arc::clone(&window), self.host.clone());
        let movement = MovementSystem::builder()
            .camera(Rc::clone(&self.camera))
            .surface(surface)
            .config(self.config.movement)
            .events(source)
            .build()?;
        self.movement = Some(movement);
        self.window = Some(window);
        info!("{}", controls_help());
        Ok(())
    }

    fn redraw(&mut self) {
        let dt_ms = self.frame_clock.tick();
        let (Some(window), Some(movement)) = (&self.window, &mut self.movement) else {
            return;
        };
        movement.pump_events();
        movement.update(dt_ms);

        if self.config.debug.show_position {
            window.set_title(&position_title(
                &self.config.window.title,
                &movement.player_state(),
            ));
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for VoomApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = window_attributes_from_config(&self.config);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        info!(
            "Window created: {}x{}",
            self.config.window.width, self.config.window.height
        );
        if let Err(e) = self.start(Arc::clone(&window)) {
            return self.fail(event_loop, e);
        }
        window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                if let Some(movement) = &mut self.movement {
                    movement.dispose();
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let host_event = match event.state {
                    ElementState::Pressed => HostEvent::KeyDown(code),
                    ElementState::Released => HostEvent::KeyUp(code),
                };
                self.host.send(host_event);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(movement) = &mut self.movement
                    && !movement.is_pointer_locked()
                {
                    movement.enable();
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(movement) = &mut self.movement {
                    movement.disable();
                }
            }
            WindowEvent::Focused(true) => {
                self.frame_clock.restart_at(std::time::Instant::now());
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.host.send(HostEvent::PointerMotion {
                dx: delta.0 as f32,
                dy: delta.1 as f32,
            });
        }
    }
}

/// Creates an event loop and runs the application until the window closes.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = VoomApp::new(config);
    event_loop.run_app(&mut app)?;
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_title_walking() {
        let state = PlayerState {
            position: Vec3::new(12.345, 41.0, -6.0),
            velocity: Vec3::ZERO,
            is_running: false,
            is_moving: false,
        };
        assert_eq!(position_title("Voom", &state), "Voom | x: 12.3 z: -6.0");
    }

    #[test]
    fn test_position_title_running() {
        let state = PlayerState {
            position: Vec3::new(0.0, 41.0, 0.0),
            velocity: Vec3::new(0.0, 0.0, -448.0),
            is_running: true,
            is_moving: true,
        };
        assert!(position_title("Voom", &state).ends_with("[run]"));
    }

    #[test]
    fn test_app_starts_without_window() {
        let app = VoomApp::new(Config::default());
        assert!(app.window.is_none());
        assert!(app.movement.is_none());
        assert!(app.source.is_some());
    }

    #[test]
    fn test_camera_starts_at_spawn() {
        let app = VoomApp::new(Config::default());
        assert_eq!(app.camera().position, Vec3::new(0.0, 41.0, 0.0));
    }

    #[test]
    fn test_window_attributes_build() {
        let mut config = Config::default();
        config.window.fullscreen = true;
        let _attrs = window_attributes_from_config(&config);
    }
}
