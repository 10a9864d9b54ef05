//! Frame clock

use std::time::Duration;

/// Monotonic frame clock.
///
/// Advanced once per tick by the update loop; every pool timestamp is a
/// `Duration` since the clock was created.
#[derive(Debug, Clone, Default)]
pub struct Time {
    /// Time since start
    elapsed: Duration,
    /// Length of the last frame
    delta: Duration,
    /// Frames advanced so far
    frame_count: u64,
}

impl Time {
    /// Create a clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one frame of length `delta`
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Current time since start
    #[must_use]
    #[inline]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Length of the last frame
    #[must_use]
    #[inline]
    pub const fn delta(&self) -> Duration {
        self.delta
    }

    /// Length of the last frame in seconds
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Number of frames advanced
    #[must_use]
    #[inline]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_advance() {
        let mut time = Time::new();
        time.advance(Duration::from_millis(16));
        time.advance(Duration::from_millis(20));

        assert_eq!(time.elapsed(), Duration::from_millis(36));
        assert_eq!(time.delta(), Duration::from_millis(20));
        assert_eq!(time.frame_count(), 2);
    }
}
