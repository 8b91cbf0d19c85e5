//! Frame driver.
//!
//! Rendering is driven by the display: the windowing layer calls
//! [`FrameDriver::tick`] on every redraw and requests the next one. Tests and
//! headless hosts call it directly to run N ticks synchronously.

use std::time::{Duration, Instant};

/// Information about a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Zero-based tick number since the driver was created.
    pub index: u64,
    /// Time since the previous tick (zero for the first tick after start).
    pub delta: Duration,
}

/// Start/stop switch and statistics for the render tick.
#[derive(Debug, Default)]
pub struct FrameDriver {
    running: bool,
    frame_count: u64,
    last_tick: Option<Instant>,
}

impl FrameDriver {
    /// Creates a stopped driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables ticking.
    pub fn start(&mut self) {
        if !self.running {
            log::debug!("frame driver started");
        }
        self.running = true;
        self.last_tick = None;
    }

    /// Disables ticking. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("frame driver stopped after {} frames", self.frame_count);
        }
        self.running = false;
    }

    /// Returns true between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances one tick, or returns `None` if stopped.
    pub fn tick(&mut self) -> Option<FrameInfo> {
        self.tick_at(Instant::now())
    }

    /// Advances one tick with an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> Option<FrameInfo> {
        if !self.running {
            return None;
        }
        let delta = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);
        let info = FrameInfo {
            index: self.frame_count,
            delta,
        };
        self.frame_count += 1;
        Some(info)
    }

    /// Number of ticks run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_driver_does_not_tick() {
        let mut driver = FrameDriver::new();
        assert!(driver.tick().is_none());
        assert_eq!(driver.frame_count(), 0);
    }

    #[test]
    fn test_tick_counts_and_deltas() {
        let mut driver = FrameDriver::new();
        driver.start();
        let t0 = Instant::now();
        let first = driver.tick_at(t0).unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.delta, Duration::ZERO);

        let second = driver.tick_at(t0 + Duration::from_millis(16)).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.delta, Duration::from_millis(16));

        driver.stop();
        driver.stop();
        assert!(driver.tick_at(t0 + Duration::from_millis(32)).is_none());
        assert_eq!(driver.frame_count(), 2);
    }

    #[test]
    fn test_restart_resets_delta() {
        let mut driver = FrameDriver::new();
        driver.start();
        let t0 = Instant::now();
        driver.tick_at(t0);
        driver.stop();
        driver.start();
        let info = driver.tick_at(t0 + Duration::from_secs(5)).unwrap();
        assert_eq!(info.delta, Duration::ZERO);
        assert_eq!(info.index, 1);
    }
}
