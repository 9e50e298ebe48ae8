//! # Note Catalog Module
//!
//! Static note data for the trainer: note identifiers, their equal-tempered
//! frequencies (A4 = 440 Hz), the on-screen keyboard key identifiers, and
//! which notes each clef puts into play.
//!
//! ## Features
//! - Notes C2 to B5, naturals plus the sharps a keyboard has (no E#/B#)
//! - Equal temperament frequency calculation
//! - Note name parsing ("C4", "F#4", legacy "F4#")
//! - Treble (C4-B5) and bass (C3-C4) ranges sharing middle C
//! - Cent deviation calculation for live feedback

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainerError};

/// Lowest octave the catalog supplies.
pub const LOWEST_OCTAVE: u8 = 2;
/// Highest octave the catalog supplies.
pub const HIGHEST_OCTAVE: u8 = 5;
/// Tuning reference for A4.
pub const REFERENCE_A4_HZ: f32 = 440.0;

/// MIDI number of A4, the anchor of the equal-tempered scale.
const A4_MIDI: i32 = 69;

/// Note letter, ordered as within an octave (C is the lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Semitones above C within the same octave.
    pub fn semitone(self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// E and B have no black key above them.
    pub fn takes_sharp(self) -> bool {
        !matches!(self, Letter::E | Letter::B)
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }
}

/// A single catalog note: letter, optional sharp, and octave.
///
/// A `Note` can only be built for combinations the catalog supplies, so
/// every lookup on a constructed note succeeds. Ordering follows pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note {
    // Field order matters: derived `Ord` compares octave, then letter, then sharp.
    octave: u8,
    letter: Letter,
    sharp: bool,
}

impl Note {
    /// Builds a note, failing with `InvalidNote` outside the catalog.
    pub fn new(letter: Letter, sharp: bool, octave: u8) -> Result<Self> {
        let in_range = (LOWEST_OCTAVE..=HIGHEST_OCTAVE).contains(&octave);
        if !in_range || (sharp && !letter.takes_sharp()) {
            let accidental = if sharp { "#" } else { "" };
            return Err(TrainerError::InvalidNote(format!(
                "{}{}{}",
                letter.as_char(),
                accidental,
                octave
            )));
        }
        Ok(Self { octave, letter, sharp })
    }

    /// Builds a natural (white key) note.
    pub fn natural(letter: Letter, octave: u8) -> Result<Self> {
        Self::new(letter, false, octave)
    }

    pub fn letter(&self) -> Letter {
        self.letter
    }

    pub fn is_sharp(&self) -> bool {
        self.sharp
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// MIDI note number (C4 = 60, A4 = 69).
    pub fn midi(&self) -> u8 {
        12 * (self.octave + 1) + self.letter.semitone() + u8::from(self.sharp)
    }

    /// Canonical frequency in Hz.
    pub fn frequency(&self) -> f32 {
        frequency_of(*self)
    }

    /// Identifier of the matching on-screen keyboard key.
    pub fn key_id(&self) -> String {
        key_id_of(*self)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = if self.sharp { "#" } else { "" };
        write!(f, "{}{}{}", self.letter.as_char(), accidental, self.octave)
    }
}

impl FromStr for Note {
    type Err = TrainerError;

    /// Parses "C4", "F#4", or the legacy keyboard spelling "F4#".
    fn from_str(s: &str) -> Result<Self> {
        lookup(s)
    }
}

impl TryFrom<String> for Note {
    type Error = TrainerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.to_string()
    }
}

/// A named pitch register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    Treble,
    Bass,
}

impl Clef {
    pub fn other(self) -> Clef {
        match self {
            Clef::Treble => Clef::Bass,
            Clef::Bass => Clef::Treble,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }

    /// Ordered notes playable in this clef.
    pub fn notes(self) -> &'static [Note] {
        notes_in_clef(self)
    }
}

impl fmt::Display for Clef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every catalog note in ascending pitch order.
///
/// Computed once; built with the same constructor callers use so the two
/// can never disagree about which notes exist.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    let mut notes = Vec::new();
    for octave in LOWEST_OCTAVE..=HIGHEST_OCTAVE {
        for letter in Letter::ALL {
            notes.extend(Note::natural(letter, octave));
            notes.extend(Note::new(letter, true, octave));
        }
    }
    notes
});

/// Note name to catalog index, for quick identifier lookups.
static NOTE_MAP: Lazy<BTreeMap<String, usize>> = Lazy::new(|| {
    NOTES
        .iter()
        .enumerate()
        .map(|(i, note)| (note.to_string(), i))
        .collect()
});

/// Naturals from `from` up to and including `to`.
fn natural_run(from: Note, to: Note) -> Vec<Note> {
    NOTES
        .iter()
        .copied()
        .filter(|note| !note.is_sharp() && *note >= from && *note <= to)
        .collect()
}

static TREBLE_NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    natural_run(
        Note { octave: 4, letter: Letter::C, sharp: false },
        Note { octave: 5, letter: Letter::B, sharp: false },
    )
});

static BASS_NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    natural_run(
        Note { octave: 3, letter: Letter::C, sharp: false },
        Note { octave: 4, letter: Letter::C, sharp: false },
    )
});

/// Frequency in Hz of the equal-tempered pitch with the given MIDI number.
///
/// f = 440 * 2^((n - 69) / 12)
pub fn equal_tempered_hz(midi: i32) -> f32 {
    REFERENCE_A4_HZ * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Canonical frequency of a note.
pub fn frequency_of(note: Note) -> f32 {
    equal_tempered_hz(i32::from(note.midi()))
}

/// Keyboard key identifier: `key-C4`, `key-F4sharp`.
pub fn key_id_of(note: Note) -> String {
    let suffix = if note.sharp { "sharp" } else { "" };
    format!("key-{}{}{}", note.letter.as_char(), note.octave, suffix)
}

/// Ordered notes playable in a clef.
pub fn notes_in_clef(clef: Clef) -> &'static [Note] {
    match clef {
        Clef::Treble => &TREBLE_NOTES,
        Clef::Bass => &BASS_NOTES,
    }
}

/// Every note in the catalog, ascending.
pub fn all_notes() -> &'static [Note] {
    &NOTES
}

/// Rewrites a note name into the catalog's spelling: upper-case letter,
/// sharp before the octave.
fn canonical_name(name: &str) -> Option<String> {
    let mut chars = name.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let rest = chars.as_str();
    match rest.strip_suffix('#') {
        Some(octave) if !rest.starts_with('#') => Some(format!("{letter}#{octave}")),
        _ => Some(format!("{letter}{rest}")),
    }
}

/// Looks up a note by name.
///
/// # Arguments
/// * `name` - Note name (e.g., "E4", "C#3", "c#3", "C3#")
///
/// # Returns
/// * `Ok(note)` - The catalog note
/// * `Err(TrainerError::InvalidNote)` - The name is not in the catalog
pub fn lookup(name: &str) -> Result<Note> {
    canonical_name(name)
        .and_then(|canonical| NOTE_MAP.get(&canonical))
        .map(|&index| NOTES[index])
        .ok_or_else(|| TrainerError::InvalidNote(name.to_string()))
}

/// Calculates the deviation from a target frequency in cents.
///
/// 100 cents = 1 semitone, positive = sharp, negative = flat.
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(name: &str) -> Note {
        lookup(name).unwrap()
    }

    #[test]
    fn a4_is_reference_pitch() {
        assert_eq!(note("A4").frequency(), 440.0);
        assert_eq!(note("A4").midi(), 69);
    }

    #[test]
    fn known_frequencies_match_equal_temperament_table() {
        let table = [
            ("C3", 130.81),
            ("B3", 246.94),
            ("C4", 261.63),
            ("E4", 329.63),
            ("C5", 523.25),
            ("B5", 987.77),
        ];
        for (name, hz) in table {
            let f = note(name).frequency();
            assert!((f - hz).abs() < 0.01, "{name}: expected {hz}, got {f}");
        }
    }

    #[test]
    fn frequencies_strictly_increase_with_note_order() {
        for pair in all_notes().windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(
                pair[0].frequency() < pair[1].frequency(),
                "{} should be lower than {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn catalog_has_twelve_keys_per_octave() {
        let octaves = (HIGHEST_OCTAVE - LOWEST_OCTAVE + 1) as usize;
        assert_eq!(all_notes().len(), octaves * 12);
        assert_eq!(all_notes().iter().filter(|n| n.is_sharp()).count(), octaves * 5);
    }

    #[test]
    fn parses_sharp_spellings() {
        assert_eq!(note("F#4"), note("F4#"));
        assert!(note("F#4").is_sharp());
        assert_eq!(note("f#4").to_string(), "F#4");
        assert_eq!(note(" c3# "), note("C#3"));
        assert_eq!("G#5".parse::<Note>().unwrap(), note("G#5"));
    }

    #[test]
    fn rejects_unknown_notes() {
        for name in ["", "H4", "E#4", "B#3", "C9", "C1", "C", "C#", "4C", "C4x"] {
            assert!(
                matches!(lookup(name), Err(TrainerError::InvalidNote(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn key_ids_follow_keyboard_layout() {
        assert_eq!(note("C4").key_id(), "key-C4");
        assert_eq!(note("G#5").key_id(), "key-G5sharp");
    }

    #[test]
    fn clef_ranges_share_middle_c() {
        let treble = notes_in_clef(Clef::Treble);
        let bass = notes_in_clef(Clef::Bass);

        assert_eq!(treble.len(), 14);
        assert_eq!(bass.len(), 8);
        assert_eq!(treble.first(), Some(&note("C4")));
        assert_eq!(treble.last(), Some(&note("B5")));
        assert_eq!(bass.first(), Some(&note("C3")));
        assert_eq!(bass.last(), Some(&note("C4")));
        assert!(treble.iter().all(|n| !n.is_sharp()));
    }

    #[test]
    fn note_serializes_as_its_name() {
        let json = serde_json::to_string(&note("C#3")).unwrap();
        assert_eq!(json, "\"C#3\"");
        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(back, note("C#3"));
        assert!(serde_json::from_str::<Note>("\"E#3\"").is_err());
    }

    #[test]
    fn cents_deviation_signs() {
        assert!((cents_deviation(880.0, 440.0) - 1200.0).abs() < 1e-3);
        assert!(cents_deviation(430.0, 440.0) < 0.0);
    }
}
