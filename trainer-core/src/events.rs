//! # Trainer Events Module
//!
//! What the session reports to its UI collaborator. The session pushes
//! events into an [`EventSink`]; the UI thread typically holds the other end
//! of a crossbeam channel and drains it on every frame tick.

use crossbeam_channel::Sender;
use serde::Serialize;

use crate::catalog::{Clef, Note};

/// A notification for the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrainerEvent {
    /// A new target note is on the staff.
    TargetNoteChanged {
        note: Note,
        clef: Clef,
        /// Learning mode: show the note name and highlight its key.
        reveal_name: bool,
    },
    /// A pitch was recognised as a note, whether or not it is the target.
    KeyDetected {
        note: Note,
        /// Deviation of the heard frequency from the note, in cents.
        cents: f32,
    },
    /// The target was hit; the UI plays its success feedback and then calls
    /// `feedback_complete`.
    MatchAccepted { note: Note },
    /// Audio input failed; the session is stopped.
    InputUnavailable { message: String },
    SessionStopped,
}

/// Receiver side of the session's notifications.
pub trait EventSink {
    fn emit(&mut self, event: TrainerEvent);
}

impl EventSink for Sender<TrainerEvent> {
    fn emit(&mut self, event: TrainerEvent) {
        if self.send(event).is_err() {
            log::warn!("event receiver dropped, discarding trainer event");
        }
    }
}

/// Collects events in order; handy for tests and batch callers.
impl EventSink for Vec<TrainerEvent> {
    fn emit(&mut self, event: TrainerEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn channel_sink_delivers_in_order() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<TrainerEvent>();
        let e4 = catalog::lookup("E4").unwrap();

        tx.emit(TrainerEvent::MatchAccepted { note: e4 });
        tx.emit(TrainerEvent::SessionStopped);

        assert_eq!(rx.try_recv(), Ok(TrainerEvent::MatchAccepted { note: e4 }));
        assert_eq!(rx.try_recv(), Ok(TrainerEvent::SessionStopped));
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<TrainerEvent>();
        drop(rx);
        tx.emit(TrainerEvent::SessionStopped);
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let event = TrainerEvent::TargetNoteChanged {
            note: catalog::lookup("G#5").unwrap(),
            clef: Clef::Treble,
            reveal_name: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "target_note_changed");
        assert_eq!(json["note"], "G#5");
        assert_eq!(json["clef"], "treble");
        assert_eq!(json["reveal_name"], true);
    }
}
