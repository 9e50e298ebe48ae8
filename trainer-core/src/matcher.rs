//! # Pitch Matching Module
//!
//! Turns one noisy (frequency, clarity) estimate into a discrete note
//! judgment against a set of candidate notes.
//!
//! ## Algorithm
//! 1. Reject the observation when its clarity is below the device
//!    profile's threshold.
//! 2. Classify the frequency's octave band.
//! 3. Take the nearest candidate in that octave, if it lies within the
//!    note's tolerance.
//! 4. Otherwise take the nearest candidate within tolerance across all
//!    octaves. Band-edge misclassification is common, so this fallback is
//!    always tried.
//!
//! Ties on exactly equal distance go to the lower note.

use crate::catalog::Note;
use crate::config::{DeviceProfile, MatchTuning};
use crate::octave::OctaveClassifier;
use crate::PitchObservation;

/// Result of evaluating one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// No usable frequency (silence, noise, or a non-positive reading).
    Unvoiced,
    /// Clarity below the profile threshold.
    LowConfidence,
    /// No candidate within tolerance.
    NoMatch,
    Matched {
        note: Note,
        /// True when the note came from the all-octave fallback search.
        octave_fallback: bool,
    },
}

impl MatchOutcome {
    pub fn note(&self) -> Option<Note> {
        match self {
            MatchOutcome::Matched { note, .. } => Some(*note),
            _ => None,
        }
    }
}

/// Octave-aware nearest-note matcher with per-profile tolerance.
#[derive(Debug, Clone)]
pub struct PitchMatcher {
    classifier: OctaveClassifier,
    tuning: MatchTuning,
}

impl PitchMatcher {
    /// A matcher banded over the catalog's octaves.
    pub fn new(tuning: MatchTuning) -> Self {
        Self::with_classifier(tuning, OctaveClassifier::for_catalog())
    }

    pub fn with_classifier(tuning: MatchTuning, classifier: OctaveClassifier) -> Self {
        Self { classifier, tuning }
    }

    pub fn classifier(&self) -> &OctaveClassifier {
        &self.classifier
    }

    pub fn clarity_threshold(&self, profile: DeviceProfile) -> f32 {
        self.tuning.profiles.get(profile).clarity_threshold
    }

    /// Largest absolute frequency difference (Hz) still accepted for `note`.
    ///
    /// The profile's cent tolerance is widened for the low register and then
    /// converted to Hz at the note's own frequency.
    pub fn tolerance_hz(&self, profile: DeviceProfile, note: Note) -> f32 {
        let mut cents = self.tuning.profiles.get(profile).tolerance_cents;
        let low = &self.tuning.low_register;
        if note.octave() <= low.max_octave {
            cents *= low.tolerance_scale;
        }
        note.frequency() * (2.0_f32.powf(cents / 1200.0) - 1.0)
    }

    /// Matches an observation, returning the note or `None`.
    ///
    /// # Arguments
    /// * `observation` - One frame's estimate from the pitch estimator
    /// * `candidates` - Notes that may be reported
    /// * `profile` - Device profile selecting threshold and tolerance
    pub fn match_note(
        &self,
        observation: &PitchObservation,
        candidates: &[Note],
        profile: DeviceProfile,
    ) -> Option<Note> {
        self.evaluate(observation, candidates, profile).note()
    }

    /// Like [`match_note`](Self::match_note), but reports why nothing matched.
    pub fn evaluate(
        &self,
        observation: &PitchObservation,
        candidates: &[Note],
        profile: DeviceProfile,
    ) -> MatchOutcome {
        let frequency = match observation.frequency {
            Some(f) if f.is_finite() && f > 0.0 => f,
            _ => return MatchOutcome::Unvoiced,
        };

        let clarity = observation.confidence;
        if clarity.is_nan() || clarity < self.clarity_threshold(profile) {
            return MatchOutcome::LowConfidence;
        }

        let octave = self.classifier.classify(frequency);
        let in_octave = candidates.iter().filter(|note| note.octave() == octave);
        if let Some(note) = self.nearest_within_tolerance(frequency, in_octave, profile) {
            return MatchOutcome::Matched {
                note,
                octave_fallback: false,
            };
        }

        match self.nearest_within_tolerance(frequency, candidates.iter(), profile) {
            Some(note) => MatchOutcome::Matched {
                note,
                octave_fallback: true,
            },
            None => MatchOutcome::NoMatch,
        }
    }

    fn nearest_within_tolerance<'a>(
        &self,
        frequency: f32,
        candidates: impl Iterator<Item = &'a Note>,
        profile: DeviceProfile,
    ) -> Option<Note> {
        candidates
            .map(|&note| (note, (frequency - note.frequency()).abs()))
            .filter(|&(note, diff)| diff < self.tolerance_hz(profile, note))
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(note, _)| note)
    }
}

impl Default for PitchMatcher {
    fn default() -> Self {
        Self::new(MatchTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, Clef};

    const PROFILES: [DeviceProfile; 2] = [DeviceProfile::Standard, DeviceProfile::Compact];

    fn heard(frequency: f32, confidence: f32) -> PitchObservation {
        PitchObservation::voiced(frequency, confidence, 0)
    }

    fn note(name: &str) -> Note {
        catalog::lookup(name).unwrap()
    }

    #[test]
    fn exact_frequencies_round_trip() {
        let matcher = PitchMatcher::default();
        for clef in [Clef::Treble, Clef::Bass] {
            let candidates = clef.notes();
            for &n in candidates {
                for profile in PROFILES {
                    let got = matcher.match_note(&heard(n.frequency(), 1.0), candidates, profile);
                    assert_eq!(got, Some(n), "{n} on {clef} ({profile:?})");
                }
            }
        }
    }

    #[test]
    fn just_inside_tolerance_still_matches() {
        let matcher = PitchMatcher::default();
        for clef in [Clef::Treble, Clef::Bass] {
            let candidates = clef.notes();
            for &n in candidates {
                for profile in PROFILES {
                    let tol = matcher.tolerance_hz(profile, n);
                    for f in [n.frequency() + 0.99 * tol, n.frequency() - 0.99 * tol] {
                        let got = matcher.match_note(&heard(f, 1.0), candidates, profile);
                        assert_eq!(got, Some(n), "{f:.2} Hz should match {n} ({profile:?})");
                    }
                }
            }
        }
    }

    #[test]
    fn just_outside_tolerance_never_reports_a_farther_note() {
        let matcher = PitchMatcher::default();
        for clef in [Clef::Treble, Clef::Bass] {
            let candidates = clef.notes();
            for &n in candidates {
                for profile in PROFILES {
                    let tol = matcher.tolerance_hz(profile, n);
                    for f in [n.frequency() + 1.01 * tol, n.frequency() - 1.01 * tol] {
                        match matcher.match_note(&heard(f, 1.0), candidates, profile) {
                            None => {}
                            Some(other) => {
                                assert_ne!(other, n);
                                assert!(
                                    (f - other.frequency()).abs() < (f - n.frequency()).abs(),
                                    "{f:.2} Hz reported {other}, farther than {n}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn treble_frequency_does_not_match_bass_candidates() {
        let matcher = PitchMatcher::default();
        let outcome = matcher.evaluate(&heard(650.0, 0.95), Clef::Bass.notes(), DeviceProfile::Standard);
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[test]
    fn clarity_threshold_depends_on_profile() {
        let matcher = PitchMatcher::default();
        let obs = heard(note("A4").frequency(), 0.6);
        let candidates = Clef::Treble.notes();

        assert_eq!(
            matcher.evaluate(&obs, candidates, DeviceProfile::Standard),
            MatchOutcome::LowConfidence
        );
        assert_eq!(
            matcher.match_note(&obs, candidates, DeviceProfile::Compact),
            Some(note("A4"))
        );
    }

    #[test]
    fn unvoiced_and_invalid_frequencies_are_rejected() {
        let matcher = PitchMatcher::default();
        let candidates = catalog::all_notes();
        let profile = DeviceProfile::Standard;

        assert_eq!(
            matcher.evaluate(&PitchObservation::unvoiced(0), candidates, profile),
            MatchOutcome::Unvoiced
        );
        for f in [0.0, -220.0, f32::NAN, f32::INFINITY] {
            assert_eq!(matcher.evaluate(&heard(f, 1.0), candidates, profile), MatchOutcome::Unvoiced);
        }
    }

    #[test]
    fn non_finite_clarity_is_low_confidence() {
        let matcher = PitchMatcher::default();
        let candidates = Clef::Treble.notes();
        for clarity in [f32::NAN, f32::NEG_INFINITY] {
            let obs = heard(note("A4").frequency(), clarity);
            assert_eq!(
                matcher.evaluate(&obs, candidates, DeviceProfile::Standard),
                MatchOutcome::LowConfidence
            );
            assert_eq!(matcher.match_note(&obs, candidates, DeviceProfile::Compact), None);
        }
    }

    #[test]
    fn falls_back_to_other_octaves_near_band_edges() {
        let mut tuning = MatchTuning::default();
        tuning.profiles.standard.tolerance_cents = 90.0;
        let matcher = PitchMatcher::new(tuning);

        // 60 cents flat of C4 lands in the octave 3 band.
        let flat_c4 = note("C4").frequency() * 2.0_f32.powf(-60.0 / 1200.0);
        assert_eq!(matcher.classifier().classify(flat_c4), 3);

        let candidates = [note("C4"), note("D4")];
        let outcome = matcher.evaluate(&heard(flat_c4, 1.0), &candidates, DeviceProfile::Standard);
        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                note: note("C4"),
                octave_fallback: true
            }
        );
    }

    #[test]
    fn any_note_candidates_include_sharps() {
        let matcher = PitchMatcher::default();
        let got = matcher.match_note(&heard(329.63, 0.95), catalog::all_notes(), DeviceProfile::Standard);
        assert_eq!(got, Some(note("E4")));

        let fs = note("F#4").frequency();
        let got = matcher.match_note(&heard(fs + 1.0, 0.95), catalog::all_notes(), DeviceProfile::Standard);
        assert_eq!(got, Some(note("F#4")));
    }

    #[test]
    fn low_register_gets_wider_relative_tolerance() {
        let matcher = PitchMatcher::default();
        let profile = DeviceProfile::Standard;
        let c3 = note("C3");
        let c4 = note("C4");
        let ratio_c3 = matcher.tolerance_hz(profile, c3) / c3.frequency();
        let ratio_c4 = matcher.tolerance_hz(profile, c4) / c4.frequency();
        assert!(ratio_c3 > ratio_c4);
        assert!(
            matcher.tolerance_hz(DeviceProfile::Compact, c4) > matcher.tolerance_hz(profile, c4)
        );
    }

    #[test]
    fn single_band_classifier_still_matches_through_fallback() {
        let matcher =
            PitchMatcher::with_classifier(MatchTuning::default(), OctaveClassifier::single_band(4));
        let got = matcher.evaluate(&heard(note("C3").frequency(), 1.0), Clef::Bass.notes(), DeviceProfile::Standard);
        assert_eq!(
            got,
            MatchOutcome::Matched {
                note: note("C3"),
                octave_fallback: true
            }
        );
    }
}
