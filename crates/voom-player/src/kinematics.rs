//! Player kinematics: intent to desired velocity, smoothing, and integration.

use glam::Vec3;
use voom_config::MovementConfig;
use voom_input::MovementIntent;

/// Horizontal speed (units/s) below which friction snaps velocity to zero.
pub const STOP_SPEED: f32 = 1.0;

/// Velocity magnitude above which the player counts as moving.
pub const MOVING_THRESHOLD: f32 = 0.1;

/// Longest tick the integrator accepts, in seconds. Larger values are capped.
pub const MAX_TICK_SECONDS: f32 = 3600.0;

/// Velocity is kept below this multiple of the run speed so that repeated
/// overshooting ticks stay finite.
pub const OVERSHOOT_GUARD: f32 = 1000.0;

/// Snapshot of the player for the owning application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    /// Eye position.
    pub position: Vec3,
    /// Current velocity (vertical component always zero).
    pub velocity: Vec3,
    /// Whether the run modifier was held on the last tick.
    pub is_running: bool,
    /// Whether velocity magnitude exceeds [`MOVING_THRESHOLD`].
    pub is_moving: bool,
}

/// Holds position and velocity and advances them once per tick.
///
/// Motion is strictly horizontal: after every tick `velocity.y == 0` and
/// `position.y == eye_height`.
#[derive(Debug, Clone)]
pub struct KinematicIntegrator {
    config: MovementConfig,
    position: Vec3,
    velocity: Vec3,
    desired_velocity: Vec3,
    running: bool,
}

impl KinematicIntegrator {
    /// Spawn at `spawn`, or at the origin at eye height when `None`.
    #[must_use]
    pub fn new(config: MovementConfig, spawn: Option<Vec3>) -> Self {
        let spawn = spawn.unwrap_or_else(|| Vec3::from_array(config.spawn_position()));
        let mut integrator = Self {
            config,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            desired_velocity: Vec3::ZERO,
            running: false,
        };
        integrator.set_position(spawn);
        integrator
    }

    fn default_spawn(&self) -> Vec3 {
        Vec3::from_array(self.config.spawn_position())
    }

    /// Advance one tick of `dt` seconds.
    ///
    /// `forward` and `right` are the horizontal basis vectors of the current
    /// view. Non-finite or negative `dt` counts as zero.
    pub fn update(&mut self, dt: f32, intent: &MovementIntent, forward: Vec3, right: Vec3) {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt.min(MAX_TICK_SECONDS)
        } else {
            0.0
        };
        self.running = intent.run;
        self.desired_velocity = self.desired_velocity_for(intent, forward, right);

        if self.desired_velocity != Vec3::ZERO {
            // First-order approach; overshoots when acceleration * dt > 1.
            let rate = self.config.acceleration * dt;
            self.velocity.x += (self.desired_velocity.x - self.velocity.x) * rate;
            self.velocity.z += (self.desired_velocity.z - self.velocity.z) * rate;
        } else {
            let decay = (1.0 - self.config.friction * dt).max(0.0);
            self.velocity.x *= decay;
            self.velocity.z *= decay;
            if self.velocity.length() < STOP_SPEED {
                self.velocity = Vec3::ZERO;
            }
        }

        self.velocity.y = 0.0;
        self.velocity = self
            .velocity
            .clamp_length_max(self.config.run_speed() * OVERSHOOT_GUARD);
        self.position += self.velocity * dt;
        self.position.y = self.config.eye_height;
    }

    /// Sum the basis vectors of the active directions and scale the unit
    /// result to walk or run speed. Opposing keys cancel; a zero or
    /// non-finite sum yields no movement.
    fn desired_velocity_for(&self, intent: &MovementIntent, forward: Vec3, right: Vec3) -> Vec3 {
        let mut direction = Vec3::ZERO;
        if intent.forward {
            direction += forward;
        }
        if intent.backward {
            direction -= forward;
        }
        if intent.right {
            direction += right;
        }
        if intent.left {
            direction -= right;
        }

        let speed = if self.running {
            self.config.run_speed()
        } else {
            self.config.walk_speed
        };
        direction
            .try_normalize()
            .map_or(Vec3::ZERO, |dir| dir * speed)
    }

    /// Eye position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Target velocity computed on the last tick.
    #[must_use]
    pub fn desired_velocity(&self) -> Vec3 {
        self.desired_velocity
    }

    /// Horizontal speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }

    /// Whether velocity magnitude exceeds [`MOVING_THRESHOLD`].
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.velocity.length() > MOVING_THRESHOLD
    }

    /// Whether the run modifier was held on the last tick.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Snapshot for the owning application.
    #[must_use]
    pub fn state(&self) -> PlayerState {
        PlayerState {
            position: self.position,
            velocity: self.velocity,
            is_running: self.running,
            is_moving: self.is_moving(),
        }
    }

    /// Teleport. Height is forced to eye level and all velocity is zeroed;
    /// the running flag is left alone.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = Vec3::new(position.x, self.config.eye_height, position.z);
        self.velocity = Vec3::ZERO;
        self.desired_velocity = Vec3::ZERO;
    }

    /// Like [`set_position`](Self::set_position) but also clears running.
    /// `None` returns to the origin at eye height.
    pub fn reset(&mut self, position: Option<Vec3>) {
        let position = position.unwrap_or_else(|| self.default_spawn());
        self.set_position(position);
        self.running = false;
    }
}
