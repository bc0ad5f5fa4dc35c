//! Edge-triggered keyboard intent tracker.
//!
//! [`KeyInputTracker`] turns raw key-down/key-up events into a
//! [`MovementIntent`] record. Flags change only on matching key transitions,
//! OS key repeat is suppressed through a held-key set, and Escape produces a
//! 100 ms pulse instead of a held state.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};
use winit::keyboard::KeyCode;

use crate::keybindings::{MovementKey, movement_key};
use crate::observer::{ListenerId, Observers};
use crate::timer::{Clock, PulseTimer, SystemClock};

/// How long the escape pulse stays raised.
pub const ESCAPE_PULSE: Duration = Duration::from_millis(100);

/// Boolean movement intent derived from key state.
///
/// Opposite directions may both be set; resolving them is the integrator's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    /// Forward key held.
    pub forward: bool,
    /// Backward key held.
    pub backward: bool,
    /// Strafe-left key held.
    pub left: bool,
    /// Strafe-right key held.
    pub right: bool,
    /// Run modifier held.
    pub run: bool,
    /// Raised for [`ESCAPE_PULSE`] after Escape is pressed.
    pub escape_pulse: bool,
}

impl MovementIntent {
    /// Whether any of the four direction flags is set.
    #[must_use]
    pub fn has_direction(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    fn flag_mut(&mut self, key: MovementKey) -> &mut bool {
        match key {
            MovementKey::Forward => &mut self.forward,
            MovementKey::Backward => &mut self.backward,
            MovementKey::Left => &mut self.left,
            MovementKey::Right => &mut self.right,
            MovementKey::Run => &mut self.run,
            MovementKey::Escape => &mut self.escape_pulse,
        }
    }
}

/// Tracks movement intent from key events and notifies observers on change.
///
/// Starts disabled. While disabled only Escape is observed.
pub struct KeyInputTracker {
    state: MovementIntent,
    held: HashSet<KeyCode>,
    enabled: bool,
    disposed: bool,
    listeners: Observers<MovementIntent>,
    escape_timer: PulseTimer,
    clock: Box<dyn Clock>,
}

impl Default for KeyInputTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyInputTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyInputTracker")
            .field("state", &self.state)
            .field("held", &self.held)
            .field("enabled", &self.enabled)
            .field("disposed", &self.disposed)
            .field("listeners", &self.listeners)
            .field("escape_timer", &self.escape_timer)
            .finish()
    }
}

impl KeyInputTracker {
    /// Creates a disabled tracker driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// Creates a disabled tracker whose escape pulse is timed by `clock`.
    #[must_use]
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            state: MovementIntent::default(),
            held: HashSet::new(),
            enabled: false,
            disposed: false,
            listeners: Observers::new(),
            escape_timer: PulseTimer::new(ESCAPE_PULSE),
            clock,
        }
    }

    /// Clear all intent and start accepting key events. No-op if already enabled.
    pub fn enable(&mut self) {
        if self.enabled || self.disposed {
            return;
        }
        info!("Enabling key input");
        self.enabled = true;
        self.reset();
    }

    /// Clear all intent and stop accepting key events (Escape excepted).
    /// No-op if already disabled.
    pub fn disable(&mut self) {
        if !self.enabled || self.disposed {
            return;
        }
        info!("Disabling key input");
        self.enabled = false;
        self.reset();
    }

    /// Whether key events are currently accepted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Process a key-down.
    ///
    /// Ignored while disabled (except Escape), for keys already held, and for
    /// unbound keys.
    pub fn handle_key_down(&mut self, code: KeyCode) {
        if self.disposed {
            return;
        }
        let key = movement_key(code);
        if !self.enabled && key != Some(MovementKey::Escape) {
            return;
        }
        if !self.held.insert(code) {
            return;
        }
        let Some(key) = key else {
            return;
        };

        let flag = self.state.flag_mut(key);
        if *flag {
            return;
        }
        *flag = true;
        if key == MovementKey::Escape {
            self.escape_timer.schedule(self.clock.now());
        }
        debug!(?code, ?key, "key down");
        self.notify();
    }

    /// Process a key-up. Releasing a flag that is already clear is silent.
    pub fn handle_key_up(&mut self, code: KeyCode) {
        if self.disposed {
            return;
        }
        self.held.remove(&code);
        if !self.enabled {
            return;
        }
        match movement_key(code) {
            None | Some(MovementKey::Escape) => {}
            Some(key) => {
                let flag = self.state.flag_mut(key);
                if *flag {
                    *flag = false;
                    debug!(?code, ?key, "key up");
                    self.notify();
                }
            }
        }
    }

    /// Clear the escape pulse if its deadline has passed. Returns `true` if it fired.
    pub fn poll(&mut self) -> bool {
        if self.disposed || !self.escape_timer.fire_if_due(self.clock.now()) {
            return false;
        }
        self.state.escape_pulse = false;
        self.notify();
        true
    }

    /// Snapshot of the current intent.
    #[must_use]
    pub fn state(&self) -> MovementIntent {
        self.state
    }

    /// Register an intent observer. Observers run in registration order.
    pub fn add_listener(&mut self, listener: impl FnMut(&MovementIntent) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister an observer. Unknown ids are ignored.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Clear every flag, forget held keys, cancel the escape pulse and notify.
    pub fn reset(&mut self) {
        self.state = MovementIntent::default();
        self.held.clear();
        self.escape_timer.cancel();
        self.notify();
    }

    /// Tear down: cancel the pending pulse, drop observers, clear state.
    /// Every later call is ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.listeners.clear();
        self.reset();
        self.enabled = false;
        self.disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether an escape pulse is waiting to be cleared.
    #[must_use]
    pub fn escape_pending(&self) -> bool {
        self.escape_timer.is_pending()
    }

    fn notify(&mut self) {
        let snapshot = self.state;
        self.listeners.notify(&snapshot);
    }
}
