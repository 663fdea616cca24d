//! Frame statistics

use std::collections::VecDeque;
use std::time::Duration;

const DEFAULT_SAMPLES: usize = 120;

/// Rolling frame time statistics over the last few ticks
#[derive(Debug)]
pub struct FrameStats {
    samples: VecDeque<Duration>,
    max_samples: usize,
    total_frames: u64,
}

impl FrameStats {
    #[must_use]
    pub fn new() -> Self {
        Self::with_samples(DEFAULT_SAMPLES)
    }

    #[must_use]
    pub fn with_samples(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            total_frames: 0,
        }
    }

    pub fn record_frame(&mut self, delta: Duration) {
        self.total_frames += 1;
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(delta);
    }

    /// Average frame time over the window
    #[must_use]
    pub fn average(&self) -> Duration {
        match u32::try_from(self.samples.len()) {
            Ok(count) if count > 0 => self.samples.iter().sum::<Duration>() / count,
            _ => Duration::ZERO,
        }
    }

    /// Frames per second over the window; zero until time has passed
    #[must_use]
    pub fn fps(&self) -> f32 {
        let average = self.average().as_secs_f32();
        if average > 0.0 { 1.0 / average } else { 0.0 }
    }

    #[must_use]
    pub fn worst(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or_default()
    }

    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    #[must_use]
    pub fn format_stats(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2}ms (worst: {:.2}ms)",
            self.fps(),
            self.average().as_secs_f32() * 1000.0,
            self.worst().as_secs_f32() * 1000.0
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}
