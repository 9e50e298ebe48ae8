//! # Stability Gate Module
//!
//! A candidate note must be observed continuously for a minimum duration
//! before it is accepted. Single-frame spikes and octave flutter never last
//! that long, so they never become matches.
//!
//! Each sustained episode is accepted exactly once. Holding the note longer
//! does not re-emit it; the episode has to end (a different note, or no
//! note) before the same note can be accepted again.

use crate::catalog::Note;

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Tracking {
        note: Note,
        since_ms: u64,
        /// Already accepted during this episode.
        emitted: bool,
    },
}

/// Duration gate between the matcher and the session.
#[derive(Debug, Clone)]
pub struct StabilityGate {
    threshold_ms: u64,
    state: GateState,
}

impl StabilityGate {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            state: GateState::Idle,
        }
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// The note of the current episode, if one is being tracked.
    pub fn tracking(&self) -> Option<Note> {
        match self.state {
            GateState::Tracking { note, .. } => Some(note),
            GateState::Idle => None,
        }
    }

    /// Feeds one frame's matched note (or `None`).
    ///
    /// # Returns
    /// * `Some(note)` - The first frame at which `note` has been held for
    ///   the threshold duration
    /// * `None` - Otherwise
    pub fn observe(&mut self, candidate: Option<Note>, timestamp_ms: u64) -> Option<Note> {
        let Some(note) = candidate else {
            if let GateState::Tracking { note, .. } = self.state {
                log::debug!("gate: lost {note}, back to idle");
            }
            self.state = GateState::Idle;
            return None;
        };

        let continuing = matches!(
            self.state,
            GateState::Tracking { note: tracked, .. } if tracked == note
        );
        if !continuing {
            log::debug!("gate: tracking {note} from {timestamp_ms} ms");
            self.state = GateState::Tracking {
                note,
                since_ms: timestamp_ms,
                emitted: false,
            };
        }

        if let GateState::Tracking { since_ms, emitted, .. } = &mut self.state {
            if !*emitted && timestamp_ms.saturating_sub(*since_ms) >= self.threshold_ms {
                *emitted = true;
                return Some(note);
            }
        }
        None
    }

    /// Discards any in-flight episode without accepting it.
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
    }
}
