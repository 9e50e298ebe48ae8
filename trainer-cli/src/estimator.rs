//! Per-frame pitch estimate from the McLeod pitch method.

use pitch_detection::detector::PitchDetector;
use pitch_detection::detector::mcleod::McLeodDetector;
use trainer_core::{DeviceProfile, PitchObservation};

/// Frame size for standard devices (~46 ms at 44.1 kHz).
pub const STANDARD_FRAME_SIZE: usize = 2048;
/// Shorter frames for compact devices, which answer faster with noisier
/// estimates.
pub const COMPACT_FRAME_SIZE: usize = 1024;

// Kept low on purpose: the matcher applies the profile's clarity threshold.
const POWER_THRESHOLD: f64 = 0.2;
const CLARITY_THRESHOLD: f64 = 0.2;

pub fn frame_size_for(profile: DeviceProfile) -> usize {
    match profile {
        DeviceProfile::Standard => STANDARD_FRAME_SIZE,
        DeviceProfile::Compact => COMPACT_FRAME_SIZE,
    }
}

/// Turns captured frames into [`PitchObservation`]s.
pub struct PitchEstimator {
    detector: McLeodDetector<f64>,
    frame_size: usize,
    sample_rate: usize,
    signal: Vec<f64>,
}

impl PitchEstimator {
    pub fn new(frame_size: usize, sample_rate: u32) -> Self {
        Self {
            detector: McLeodDetector::new(frame_size, frame_size / 2),
            frame_size,
            sample_rate: sample_rate as usize,
            signal: Vec::with_capacity(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Estimates the fundamental of one frame.
    ///
    /// Silence, noise and frames of the wrong length come back unvoiced.
    pub fn estimate(&mut self, frame: &[f32], timestamp_ms: u64) -> PitchObservation {
        if frame.len() != self.frame_size {
            log::debug!("skipping {}-sample frame, expected {}", frame.len(), self.frame_size);
            return PitchObservation::unvoiced(timestamp_ms);
        }

        self.signal.clear();
        self.signal.extend(frame.iter().map(|&s| f64::from(s)));

        match self
            .detector
            .get_pitch(&self.signal, self.sample_rate, POWER_THRESHOLD, CLARITY_THRESHOLD)
        {
            Some(pitch) => PitchObservation::voiced(
                pitch.frequency as f32,
                pitch.clarity.clamp(0.0, 1.0) as f32,
                timestamp_ms,
            ),
            None => PitchObservation::unvoiced(timestamp_ms),
        }
    }
}
