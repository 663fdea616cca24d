//! Frame timing

use std::time::{Duration, Instant};

/// Clock advanced once per tick
///
/// [`Time::update`] measures the wall clock; [`Time::advance`] steps by a
/// fixed amount for headless runs and tests.
#[derive(Debug, Clone)]
pub struct Time {
    last_update: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Start a new frame from the wall clock
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_update);
        self.last_update = now;
        self.step(delta);
    }

    /// Start a new frame `delta` after the previous one
    pub fn advance(&mut self, delta: Duration) {
        self.last_update = Instant::now();
        self.step(delta);
    }

    fn step(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Time between the previous frame and this one
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut time = Time::new();
        assert_eq!(time.delta(), Duration::ZERO);

        time.advance(Duration::from_millis(250));
        time.advance(Duration::from_millis(500));

        assert!((time.delta_seconds() - 0.5).abs() < f32::EPSILON);
        assert_eq!(time.elapsed(), Duration::from_millis(750));
        assert_eq!(time.frame_count(), 2);
    }

    #[test]
    fn test_update_measures_wall_clock() {
        let mut time = Time::new();
        std::thread::sleep(Duration::from_millis(5));
        time.update();
        assert!(time.delta() >= Duration::from_millis(5));
        assert_eq!(time.frame_count(), 1);
    }
}
