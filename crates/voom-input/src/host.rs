//! Host boundary: the events the windowing host delivers, the capturable
//! surface it exposes, and the camera transform it owns.
//!
//! Nothing in this crate subscribes to ambient, process-wide event streams.
//! The host pushes [`HostEvent`]s through a [`HostEventSender`]; whoever owns
//! the matching [`HostEventSource`] drains them and releases the subscription
//! by dropping it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use glam::{Quat, Vec3};
use winit::keyboard::KeyCode;

/// One input or capture notification from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A physical key went down (OS repeats arrive as further `KeyDown`s).
    KeyDown(KeyCode),
    /// A physical key went up.
    KeyUp(KeyCode),
    /// Raw relative pointer motion since the previous motion event.
    PointerMotion {
        /// Horizontal motion, positive to the right.
        dx: f32,
        /// Vertical motion, positive downward.
        dy: f32,
    },
    /// The host granted exclusive pointer capture.
    CaptureGranted,
    /// The host released pointer capture (user gesture, focus loss, or request).
    CaptureReleased,
    /// The host refused or failed to grant capture.
    CaptureError(String),
}

/// Producer half of a host event channel, held by the windowing host.
#[derive(Debug, Clone)]
pub struct HostEventSender {
    tx: Sender<HostEvent>,
}

impl HostEventSender {
    /// Queue an event. Returns `false` once the consumer has released its
    /// subscription.
    pub fn send(&self, event: HostEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half of a host event channel.
#[derive(Debug)]
pub struct HostEventSource {
    rx: Receiver<HostEvent>,
}

impl HostEventSource {
    /// Take the next queued event without blocking.
    pub fn try_next(&self) -> Option<HostEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of events waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Create a connected sender/source pair.
#[must_use]
pub fn host_channel() -> (HostEventSender, HostEventSource) {
    let (tx, rx) = unbounded();
    (HostEventSender { tx }, HostEventSource { rx })
}

/// The capturable input surface of the host (a window, a canvas).
///
/// Both calls are requests. The outcome comes back later as
/// [`HostEvent::CaptureGranted`], [`HostEvent::CaptureReleased`] or
/// [`HostEvent::CaptureError`].
pub trait CaptureSurface {
    /// Ask the host for exclusive pointer capture.
    fn request_capture(&mut self);
    /// Ask the host to release pointer capture.
    fn release_capture(&mut self);
}

/// Position and orientation of the externally owned camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    /// World-space eye position.
    pub position: Vec3,
    /// World-space orientation. Identity looks down -Z with +Y up.
    pub rotation: Quat,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl CameraTransform {
    /// Wrap a transform in a shared handle.
    #[must_use]
    pub fn into_handle(self) -> CameraHandle {
        Rc::new(RefCell::new(self))
    }
}

/// Shared, single-threaded handle to the host camera.
pub type CameraHandle = Rc<RefCell<CameraTransform>>;

/// A surface with no window behind it.
///
/// Counts requests and, when connected to a [`HostEventSender`], confirms
/// each one immediately (requests are granted, releases are confirmed).
/// Useful for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    requests: Rc<Cell<u32>>,
    releases: Rc<Cell<u32>>,
    confirm: Option<HostEventSender>,
}

impl HeadlessSurface {
    /// A surface that records requests and never answers them.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that answers every request through `sender`.
    #[must_use]
    pub fn confirming(sender: HostEventSender) -> Self {
        Self {
            confirm: Some(sender),
            ..Self::default()
        }
    }

    /// Number of capture requests received.
    #[must_use]
    pub fn requests(&self) -> u32 {
        self.requests.get()
    }

    /// Number of release requests received.
    #[must_use]
    pub fn releases(&self) -> u32 {
        self.releases.get()
    }
}

impl CaptureSurface for HeadlessSurface {
    fn request_capture(&mut self) {
        self.requests.set(self.requests.get() + 1);
        if let Some(sender) = &self.confirm {
            sender.send(HostEvent::CaptureGranted);
        }
    }

    fn release_capture(&mut self) {
        self.releases.set(self.releases.get() + 1);
        if let Some(sender) = &self.confirm {
            sender.send(HostEvent::CaptureReleased);
        }
    }
}
