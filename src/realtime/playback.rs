//! Gap-free scheduling of returned audio.

use crate::error::Result;
use crate::platform::AudioOutput;

/// Tracks where the next clip should start on the playback clock.
///
/// Each clip starts at the later of the previous clip's end and the current
/// clock, so clips never overlap and a late packet starts immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackScheduler {
    next_start: f64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot of `duration` seconds and return its start time.
    pub fn reserve(&mut self, now: f64, duration: f64) -> f64 {
        let start = self.next_start.max(now);
        self.next_start = start + duration.max(0.0);
        start
    }

    /// End of the last scheduled clip.
    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    /// Queue `pcm16` on `output` right after everything already scheduled.
    ///
    /// Returns the start time used.
    pub fn enqueue(&mut self, output: &dyn AudioOutput, pcm16: &[u8], sample_rate: u32) -> Result<f64> {
        let start = self.next_start.max(output.now());
        let duration = output.schedule(pcm16, sample_rate, start)?;
        Ok(self.reserve(start, duration))
    }
}
