//! # Frame Timing
//!
//! Measures the time between frames for the simulation step and counts frames
//! to report the frame rate in the window title.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use point_shadow::performance::{fps_title, FpsCounter};
//!
//! let mut counter = FpsCounter::new();
//! for _ in 0..9 {
//!     assert_eq!(counter.tick(Duration::from_millis(110)), None);
//! }
//! let fps = counter.tick(Duration::from_millis(110)).unwrap();
//! assert_eq!(fps_title("Demo", fps), "Demo (FPS: 9)");
//! ```

use std::time::{Duration, Instant};

/// Window title with the frame rate appended
pub fn fps_title(base: &str, fps: u32) -> String {
    format!("{} (FPS: {})", base, fps)
}

/// Measures the wall-clock time between consecutive frames
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
        }
    }

    /// Time since the previous call (or since creation)
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts frames and reports the average rate once per interval
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    elapsed: Duration,
    report_interval: Duration,
    last_fps: Option<u32>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    pub fn with_interval(report_interval: Duration) -> Self {
        Self {
            frames: 0,
            elapsed: Duration::ZERO,
            report_interval,
            last_fps: None,
        }
    }

    /// Records one frame that took `delta`.
    ///
    /// Once more than the report interval has accumulated, returns the rounded
    /// frame rate over that span and starts counting again.
    pub fn tick(&mut self, delta: Duration) -> Option<u32> {
        self.frames += 1;
        self.elapsed += delta;

        if self.elapsed <= self.report_interval {
            return None;
        }

        let fps = (self.frames as f64 / self.elapsed.as_secs_f64()).round() as u32;
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        self.last_fps = Some(fps);
        Some(fps)
    }

    /// The most recently reported frame rate
    pub fn fps(&self) -> Option<u32> {
        self.last_fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_after_interval() {
        let mut counter = FpsCounter::new();
        let frame = Duration::from_micros(16_667);

        let mut reports = Vec::new();
        for _ in 0..200 {
            if let Some(fps) = counter.tick(frame) {
                reports.push(fps);
            }
        }

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|&fps| fps == 60));
        assert_eq!(counter.fps(), Some(60));
    }

    #[test]
    fn test_exactly_one_interval_is_not_enough() {
        let mut counter = FpsCounter::new();
        for _ in 0..3 {
            assert_eq!(counter.tick(Duration::from_millis(250)), None);
        }
        assert_eq!(counter.tick(Duration::from_millis(250)), None);
        assert_eq!(counter.tick(Duration::from_millis(250)), Some(4));
        assert_eq!(counter.fps(), Some(4));
    }

    #[test]
    fn test_title() {
        assert_eq!(
            fps_title("Point Light Shadow Demo", 144),
            "Point Light Shadow Demo (FPS: 144)"
        );
    }

    #[test]
    fn test_frame_clock_is_monotonic() {
        let mut clock = FrameClock::new();
        let first = clock.tick();
        let second = clock.tick();
        assert!(first >= Duration::ZERO);
        assert!(second >= Duration::ZERO);
    }
}
