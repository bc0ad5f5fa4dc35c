//! Variable-step frame timing.
//!
//! Movement integrates with the real elapsed time of each frame. A stalled
//! frame (window drag, debugger break) is clamped so that the next tick does
//! not launch the player across the map.

use std::time::Instant;
use tracing::warn;

/// Longest frame, in seconds, handed to the simulation.
pub const MAX_FRAME_TIME: f64 = 0.25; // 250ms = 4 FPS minimum

/// Measures the time between consecutive frames.
#[derive(Debug)]
pub struct FrameClock {
    previous: Instant,
    frame_count: u64,
}

impl FrameClock {
    /// Starts measuring from the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Starts measuring from `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            previous: start,
            frame_count: 0,
        }
    }

    /// Elapsed milliseconds since the previous tick, clamped to
    /// [`MAX_FRAME_TIME`].
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Like [`tick`](Self::tick) with an explicit current instant.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let frame_time = now.saturating_duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.frame_count += 1;
        (clamp_frame_time(frame_time) * 1000.0) as f32
    }

    /// Restart measuring from `now` without counting a frame.
    ///
    /// Used after a pause so the first frame back is not one long step.
    pub fn restart_at(&mut self, now: Instant) {
        self.previous = now;
    }

    /// Number of ticks so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_frame_time(frame_time: f64) -> f64 {
    if frame_time > MAX_FRAME_TIME {
        warn!(
            "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
            frame_time * 1000.0,
            MAX_FRAME_TIME * 1000.0
        );
        MAX_FRAME_TIME
    } else {
        frame_time
    }
}
