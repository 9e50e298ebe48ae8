//! # Trainer Session Module
//!
//! The state machine the UI talks to. It owns the current target note, the
//! active clef, and the timing of the exercise, and it reports everything
//! the UI has to render through an [`EventSink`].
//!
//! ## States
//! - **Idle**: no session; observations are ignored.
//! - **AwaitingMatch**: a target is on the staff until its display deadline.
//!   An accepted match of the target moves to Matched; the deadline moves on
//!   to a new target without leaving the state.
//! - **Matched**: the UI plays its success feedback. `feedback_complete` (or
//!   the feedback deadline) selects the next target.
//!
//! Time is the caller's clock in milliseconds. Deadlines are plain values
//! inside the state, so any transition that replaces the state also cancels
//! whatever deadline was pending.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, Clef, Note};
use crate::config::{DeviceProfile, TrainerConfig};
use crate::error::{Result, TrainerError};
use crate::events::{EventSink, TrainerEvent};
use crate::matcher::PitchMatcher;
use crate::stability::StabilityGate;
use crate::throttle::FrameThrottle;
use crate::PitchObservation;

/// Which clefs an exercise draws notes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClefSelection {
    #[default]
    Treble,
    Bass,
    /// Both clefs, switching at random between notes.
    Both,
}

impl ClefSelection {
    pub fn clefs(self) -> &'static [Clef] {
        match self {
            ClefSelection::Treble => &[Clef::Treble],
            ClefSelection::Bass => &[Clef::Bass],
            ClefSelection::Both => &[Clef::Treble, Clef::Bass],
        }
    }

    /// Clef shown first when a session starts.
    pub fn initial(self) -> Clef {
        match self {
            ClefSelection::Bass => Clef::Bass,
            ClefSelection::Treble | ClefSelection::Both => Clef::Treble,
        }
    }
}

/// Settings supplied once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionOptions {
    pub clefs: ClefSelection,
    pub profile: DeviceProfile,
    /// Learning mode. Only affects what the UI shows, never matching.
    pub reveal_note_names: bool,
}

/// Session mode with its pending deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    AwaitingMatch { expires_at_ms: u64 },
    Matched { advance_at_ms: u64 },
}

/// State owned by the session and changed only by its transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerState {
    target: Option<Note>,
    clef: Clef,
    mode: Mode,
}

impl TrainerState {
    pub fn target(&self) -> Option<Note> {
        self.target
    }

    pub fn clef(&self) -> Clef {
        self.clef
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Coordinates matching, stability gating and note selection for one
/// learner.
pub struct TrainerSession<S: EventSink> {
    config: TrainerConfig,
    matcher: PitchMatcher,
    gate: StabilityGate,
    throttle: FrameThrottle,
    rng: StdRng,
    sink: S,
    options: SessionOptions,
    /// Notes the matcher may report: every note of the enabled clefs.
    candidates: Vec<Note>,
    state: TrainerState,
}

impl<S: EventSink> TrainerSession<S> {
    pub fn new(config: TrainerConfig, sink: S) -> Self {
        Self::with_rng(config, sink, StdRng::from_entropy())
    }

    /// A session whose note choices are reproducible.
    pub fn with_seed(config: TrainerConfig, sink: S, seed: u64) -> Self {
        Self::with_rng(config, sink, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: TrainerConfig, sink: S, rng: StdRng) -> Self {
        Self {
            matcher: PitchMatcher::new(config.matching),
            gate: StabilityGate::new(config.stability_threshold_ms),
            throttle: FrameThrottle::new(config.process_interval_ms),
            config,
            rng,
            sink,
            options: SessionOptions::default(),
            candidates: Vec::new(),
            state: TrainerState {
                target: None,
                clef: Clef::Treble,
                mode: Mode::Idle,
            },
        }
    }

    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn is_active(&self) -> bool {
        self.state.mode != Mode::Idle
    }

    /// The next time `tick` has work to do, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        match self.state.mode {
            Mode::Idle => None,
            Mode::AwaitingMatch { expires_at_ms } => Some(expires_at_ms),
            Mode::Matched { advance_at_ms } => Some(advance_at_ms),
        }
    }

    /// Starts an exercise and shows its first note.
    ///
    /// Starting while a session runs restarts it with the new options.
    pub fn start_session(&mut self, options: SessionOptions, now_ms: u64) {
        if self.is_active() {
            log::info!("restarting active session");
            self.halt();
        }

        self.options = options;
        let mut candidates: Vec<Note> = options
            .clefs
            .clefs()
            .iter()
            .flat_map(|clef| clef.notes().iter().copied())
            .collect();
        candidates.sort();
        candidates.dedup();
        self.candidates = candidates;
        self.state.clef = options.clefs.initial();

        log::info!(
            "session started: clefs {:?}, profile {:?}, reveal names {}",
            options.clefs,
            options.profile,
            options.reveal_note_names
        );
        self.advance(now_ms);
    }

    /// Ends the exercise. Any in-flight stability episode and pending
    /// deadline are discarded.
    pub fn stop_session(&mut self) {
        if !self.is_active() {
            return;
        }
        self.halt();
        log::info!("session stopped");
        self.sink.emit(TrainerEvent::SessionStopped);
    }

    /// Reports an audio acquisition failure to the UI. The session stays
    /// stopped until `start_session` is called again.
    pub fn report_input_failure(&mut self, error: &TrainerError) {
        log::warn!("input failure: {error}");
        self.halt();
        self.sink.emit(TrainerEvent::InputUnavailable {
            message: error.to_string(),
        });
    }

    /// Feeds one frame's pitch estimate.
    ///
    /// Fires due deadlines first, then throttles, matches, and gates the
    /// observation. Every recognised note is reported as `KeyDetected`; a
    /// note that passes the stability gate goes to `on_stable_match`.
    pub fn process(&mut self, observation: &PitchObservation) {
        if !self.is_active() {
            return;
        }
        let now_ms = observation.timestamp_ms;
        self.tick(now_ms);

        if !self.throttle.admit(now_ms) {
            return;
        }

        let outcome = self
            .matcher
            .evaluate(observation, &self.candidates, self.options.profile);
        log::debug!("frame at {now_ms} ms: {outcome:?}");

        let detected = outcome.note();
        if let (Some(note), Some(frequency)) = (detected, observation.frequency) {
            self.sink.emit(TrainerEvent::KeyDetected {
                note,
                cents: catalog::cents_deviation(frequency, note.frequency()),
            });
        }

        if let Some(accepted) = self.gate.observe(detected, now_ms) {
            self.on_stable_match(accepted, now_ms);
        }
    }

    /// A note clicked on the on-screen keyboard. Counts as an accepted
    /// match straight away.
    pub fn key_pressed(&mut self, note: Note, now_ms: u64) {
        if !self.is_active() {
            return;
        }
        self.sink.emit(TrainerEvent::KeyDetected { note, cents: 0.0 });
        self.on_stable_match(note, now_ms);
    }

    /// Handles a note that passed the stability gate.
    ///
    /// Only the current target counts; other notes are ignored without
    /// penalty.
    pub fn on_stable_match(&mut self, note: Note, now_ms: u64) {
        if !matches!(self.state.mode, Mode::AwaitingMatch { .. }) {
            log::debug!("ignoring {note}: not awaiting a match");
            return;
        }
        if self.state.target != Some(note) {
            log::debug!("ignoring {note}: target is {:?}", self.state.target);
            return;
        }

        log::info!("matched {note}");
        self.state.mode = Mode::Matched {
            advance_at_ms: now_ms.saturating_add(self.config.feedback_duration_ms),
        };
        self.sink.emit(TrainerEvent::MatchAccepted { note });
    }

    /// The UI finished its success feedback; move to the next note.
    pub fn feedback_complete(&mut self, now_ms: u64) {
        if matches!(self.state.mode, Mode::Matched { .. }) {
            self.advance(now_ms);
        }
    }

    /// The target's display time ran out; move on without a match.
    pub fn on_timeout(&mut self, now_ms: u64) {
        if let Mode::AwaitingMatch { .. } = self.state.mode {
            log::info!("{:?} expired unmatched", self.state.target);
            self.advance(now_ms);
        }
    }

    /// Fires whichever deadline has passed.
    pub fn tick(&mut self, now_ms: u64) {
        match self.state.mode {
            Mode::AwaitingMatch { expires_at_ms } if now_ms >= expires_at_ms => {
                self.on_timeout(now_ms);
            }
            Mode::Matched { advance_at_ms } if now_ms >= advance_at_ms => {
                log::debug!("feedback window elapsed");
                self.advance(now_ms);
            }
            _ => {}
        }
    }

    /// Shows a specific note, e.g. to repeat one the learner missed.
    ///
    /// # Returns
    /// * `Err(TrainerError::SessionInactive)` - No session is running
    /// * `Err(TrainerError::InvalidNote)` - No enabled clef contains the note
    pub fn present(&mut self, note: Note, now_ms: u64) -> Result<()> {
        if !self.is_active() {
            return Err(TrainerError::SessionInactive);
        }
        let clef = if self.state.clef.notes().contains(&note) {
            self.state.clef
        } else {
            self.options
                .clefs
                .clefs()
                .iter()
                .copied()
                .find(|clef| clef.notes().contains(&note))
                .ok_or_else(|| TrainerError::InvalidNote(note.to_string()))?
        };
        self.state.clef = clef;
        self.show(note, now_ms);
        Ok(())
    }

    /// Picks the next clef and target without changing the session.
    ///
    /// With both clefs enabled the clef is switched first with the
    /// configured probability. `exclude` is never returned unless it is the
    /// clef's only note. The pick only takes effect once a transition shows
    /// it.
    pub fn select_next_note(&mut self, exclude: Option<Note>) -> (Clef, Note) {
        let mut clef = self.state.clef;
        let p = self.config.clef_switch_probability;
        if self.options.clefs == ClefSelection::Both && p > 0.0 && self.rng.gen_bool(p.min(1.0)) {
            clef = clef.other();
            log::debug!("switching to {clef} clef");
        }

        let notes = clef.notes();
        let pool: Vec<Note> = notes
            .iter()
            .copied()
            .filter(|note| Some(*note) != exclude)
            .collect();
        let choices: &[Note] = if pool.is_empty() { notes } else { &pool };
        (clef, choices[self.rng.gen_range(0..choices.len())])
    }

    fn advance(&mut self, now_ms: u64) {
        let (clef, next) = self.select_next_note(self.state.target);
        self.state.clef = clef;
        self.show(next, now_ms);
    }

    fn show(&mut self, note: Note, now_ms: u64) {
        self.state.target = Some(note);
        self.state.mode = Mode::AwaitingMatch {
            expires_at_ms: now_ms.saturating_add(self.config.display_duration_ms),
        };
        self.gate.reset();

        log::info!("target {note} on {} clef", self.state.clef);
        self.sink.emit(TrainerEvent::TargetNoteChanged {
            note,
            clef: self.state.clef,
            reveal_name: self.options.reveal_note_names,
        });
    }

    fn halt(&mut self) {
        self.state.mode = Mode::Idle;
        self.state.target = None;
        self.gate.reset();
        self.throttle.reset();
    }
}
