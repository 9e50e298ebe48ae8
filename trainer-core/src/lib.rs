// trainer-core/src/lib.rs

//! The core logic for the note-reading trainer.
//! This crate turns pitch estimates into note judgments and runs the
//! exercise state machine around them. It is completely headless:
//! audio capture, pitch estimation and rendering belong to the frontend.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod matcher;
pub mod octave;
pub mod session;
pub mod stability;
pub mod throttle;

pub use catalog::{Clef, Note};
pub use config::{DeviceProfile, TrainerConfig};
pub use error::{Result, TrainerError};
pub use events::{EventSink, TrainerEvent};
pub use matcher::{MatchOutcome, PitchMatcher};
pub use session::{ClefSelection, SessionOptions, TrainerSession};

/// One frame's pitch estimate, as produced by the frontend's estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchObservation {
    /// Estimated fundamental in Hz, or `None` when the frame is unvoiced.
    pub frequency: Option<f32>,
    /// Estimator clarity (0.0 to 1.0).
    pub confidence: f32,
    /// Caller clock in milliseconds.
    pub timestamp_ms: u64,
}

impl PitchObservation {
    pub fn voiced(frequency: f32, confidence: f32, timestamp_ms: u64) -> Self {
        Self {
            frequency: Some(frequency),
            confidence,
            timestamp_ms,
        }
    }

    /// A frame with no usable pitch.
    pub fn unvoiced(timestamp_ms: u64) -> Self {
        Self {
            frequency: None,
            confidence: 0.0,
            timestamp_ms,
        }
    }
}
