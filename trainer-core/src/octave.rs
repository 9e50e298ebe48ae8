//! # Octave Classification Module
//!
//! Guesses the octave band of a raw frequency so the matcher can search the
//! musically plausible notes first. Autocorrelation-style estimators tend to
//! report octave-doubled or halved pitches; committing to a band before the
//! nearest-frequency search keeps a 130 Hz reading in octave 3 instead of
//! letting a flat tolerance drag it towards octave 4.
//!
//! Band edges sit at the geometric midpoint between B of one octave and C
//! of the next, i.e. a quarter tone below each C. Frequencies outside the
//! supported octaves clamp to the lowest or highest band.

use crate::catalog::{self, Letter};

/// Deterministic frequency-to-octave thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct OctaveClassifier {
    lowest: u8,
    /// Lower edge (Hz) of each band above the lowest, ascending.
    boundaries: Vec<f32>,
}

impl OctaveClassifier {
    /// Builds bands for every octave from `lowest` to `highest` inclusive.
    ///
    /// An inverted range collapses to the single band `lowest`.
    pub fn new(lowest: u8, highest: u8) -> Self {
        let boundaries = (lowest.saturating_add(1)..=highest)
            .map(lower_edge)
            .collect();
        Self { lowest, boundaries }
    }

    /// Bands for the octaves the note catalog supplies.
    pub fn for_catalog() -> Self {
        Self::new(catalog::LOWEST_OCTAVE, catalog::HIGHEST_OCTAVE)
    }

    /// A classifier with one band: every frequency maps to `octave`.
    ///
    /// Models octave-unaware matching as the degenerate case.
    pub fn single_band(octave: u8) -> Self {
        Self::new(octave, octave)
    }

    /// Classifies a frequency into an octave number.
    ///
    /// Non-finite input falls into the lowest band.
    pub fn classify(&self, frequency_hz: f32) -> u8 {
        let above = self
            .boundaries
            .iter()
            .take_while(|&&edge| frequency_hz >= edge)
            .count();
        self.lowest + above as u8
    }

    pub fn lowest_octave(&self) -> u8 {
        self.lowest
    }

    pub fn highest_octave(&self) -> u8 {
        self.lowest + self.boundaries.len() as u8
    }

    /// Lower edge in Hz of `octave`'s band; `None` for the lowest band
    /// (it extends downward without limit) or an unsupported octave.
    pub fn lower_edge_of(&self, octave: u8) -> Option<f32> {
        let index = octave.checked_sub(self.lowest)?.checked_sub(1)?;
        self.boundaries.get(index as usize).copied()
    }
}

impl Default for OctaveClassifier {
    fn default() -> Self {
        Self::for_catalog()
    }
}

/// Geometric midpoint between B(octave - 1) and C(octave).
fn lower_edge(octave: u8) -> f32 {
    let c_midi = 12 * (i32::from(octave) + 1) + i32::from(Letter::C.semitone());
    let c = catalog::equal_tempered_hz(c_midi);
    let b_below = catalog::equal_tempered_hz(c_midi - 1);
    (c * b_below).sqrt()
}
