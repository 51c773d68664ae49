//! Frame timing for the render loop
//!
//! The loop itself is cooperative: the host schedules one iteration per
//! display refresh and the controller calls [`FrameClock::tick`] at the top
//! of each. The clock hands back the per-frame delta, total elapsed time,
//! and an FPS sample whenever the sampling window closes.

use instant::Instant;
use std::cell::Cell;
use std::time::Duration;

/// Width of the FPS sampling window.
pub const SAMPLE_WINDOW: Duration = Duration::from_millis(1000);

/// Timing derived from one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Time since the previous iteration; zero on the first.
    pub delta: Duration,
    /// Time since the loop started.
    pub elapsed: Duration,
    /// Frames per second over the closed window, when one closed.
    pub fps_sample: Option<u32>,
}

/// Tracks frame deltas and the FPS sampling window.
#[derive(Debug, Default)]
pub struct FrameClock {
    started: Option<Instant>,
    last_frame: Option<Instant>,
    window_start: Option<Instant>,
    frames_in_window: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one iteration at `now`.
    ///
    /// When the window reaches or exceeds [`SAMPLE_WINDOW`], the sample is
    /// `frames * 1000 / elapsed_ms` rounded to an integer and the window
    /// restarts at `now`, so at most one sample is produced per window.
    pub fn tick(&mut self, now: Instant) -> FrameTiming {
        let started = *self.started.get_or_insert(now);
        let window_start = *self.window_start.get_or_insert(now);

        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);
        self.frames_in_window += 1;

        let window_elapsed = now.saturating_duration_since(window_start);
        let fps_sample = if window_elapsed >= SAMPLE_WINDOW {
            let fps = (self.frames_in_window as f64 * 1000.0 / window_elapsed.as_millis() as f64)
                .round() as u32;
            self.window_start = Some(now);
            self.frames_in_window = 0;
            Some(fps)
        } else {
            None
        };

        FrameTiming {
            delta,
            elapsed: now.saturating_duration_since(started),
            fps_sample,
        }
    }
}

/// Cancellation token for a scheduled frame loop.
///
/// Cancelled exactly once, at teardown; the loop also re-checks the
/// session's mounted flag every iteration, so at most one more iteration
/// can run after cancellation is requested.
#[derive(Debug, Default)]
pub struct FrameToken {
    cancelled: Cell<bool>,
}

impl FrameToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}
