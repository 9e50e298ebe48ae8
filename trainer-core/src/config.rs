//! # Trainer Configuration Module
//!
//! One configuration object for every tuning constant the trainer uses:
//! timing (stability, note display, feedback, frame throttle), clef
//! switching, and the per-device-profile matching thresholds.
//!
//! `#[serde(default)]` on every struct means a config file only has to name
//! the fields it changes; everything else keeps its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainerError};

/// Input hardware class, chosen by the UI layer at session start.
///
/// `Compact` is for resource-constrained input (phones, small analysis
/// windows) whose pitch estimates are noisier: it accepts lower clarity and
/// matches with a wider tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    #[default]
    Standard,
    Compact,
}

/// Matching thresholds for one device profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileTuning {
    /// Minimum estimator clarity (0.0 to 1.0) for an observation to count.
    pub clarity_threshold: f32,
    /// Maximum distance from a note, in cents, converted to Hz per note.
    pub tolerance_cents: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTable {
    pub standard: ProfileTuning,
    pub compact: ProfileTuning,
}

impl ProfileTable {
    pub fn get(&self, profile: DeviceProfile) -> &ProfileTuning {
        match profile {
            DeviceProfile::Standard => &self.standard,
            DeviceProfile::Compact => &self.compact,
        }
    }
}

/// Extra tolerance for the bass register, where fixed-size analysis
/// windows resolve frequency more coarsely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowRegister {
    /// Notes at or below this octave get the scaled tolerance.
    pub max_octave: u8,
    /// Multiplier applied to `tolerance_cents` for those notes.
    pub tolerance_scale: f32,
}

/// Matcher-facing part of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    pub profiles: ProfileTable,
    pub low_register: LowRegister,
}

/// Trainer configuration, usually loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// How long a note must be held before it is accepted.
    pub stability_threshold_ms: u64,
    /// How long a target note stays up before the session moves on.
    pub display_duration_ms: u64,
    /// Longest wait in the matched state for the UI's feedback signal.
    pub feedback_duration_ms: u64,
    /// Observations closer together than this are dropped.
    pub process_interval_ms: u64,
    /// Chance of switching clef before each pick when both are enabled.
    pub clef_switch_probability: f64,
    pub matching: MatchTuning,
}

// --- Default implementations ---

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            standard: ProfileTuning {
                clarity_threshold: 0.80,
                tolerance_cents: 25.0,
            },
            compact: ProfileTuning {
                clarity_threshold: 0.55,
                tolerance_cents: 38.0,
            },
        }
    }
}

impl Default for LowRegister {
    fn default() -> Self {
        Self {
            max_octave: 3,
            tolerance_scale: 1.25,
        }
    }
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            profiles: ProfileTable::default(),
            low_register: LowRegister::default(),
        }
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            stability_threshold_ms: 100,
            display_duration_ms: 4000,
            feedback_duration_ms: 600,
            process_interval_ms: 50,
            clef_switch_probability: 0.3,
            matching: MatchTuning::default(),
        }
    }
}

impl TrainerConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrainerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| TrainerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Writes the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| TrainerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.display_duration_ms == 0 {
            return Err(invalid("display_duration_ms must be positive"));
        }
        if !(0.0..=1.0).contains(&self.clef_switch_probability) {
            return Err(invalid("clef_switch_probability must be within [0, 1]"));
        }

        let profiles = &self.matching.profiles;
        for (name, tuning) in [("standard", &profiles.standard), ("compact", &profiles.compact)] {
            if !(0.0..=1.0).contains(&tuning.clarity_threshold) {
                return Err(TrainerError::InvalidConfig(format!(
                    "{name} clarity_threshold must be within [0, 1]"
                )));
            }
            if !tuning.tolerance_cents.is_finite() || tuning.tolerance_cents <= 0.0 {
                return Err(TrainerError::InvalidConfig(format!(
                    "{name} tolerance_cents must be positive"
                )));
            }
        }

        let scale = self.matching.low_register.tolerance_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(invalid("low_register.tolerance_scale must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> TrainerError {
    TrainerError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let cfg = TrainerConfig::default();
        assert_eq!(cfg.stability_threshold_ms, 100);
        assert_eq!(cfg.display_duration_ms, 4000);
        assert_eq!(cfg.process_interval_ms, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn compact_profile_is_more_permissive() {
        let profiles = ProfileTable::default();
        let standard = profiles.get(DeviceProfile::Standard);
        let compact = profiles.get(DeviceProfile::Compact);
        assert!(compact.clarity_threshold < standard.clarity_threshold);
        assert!(compact.tolerance_cents > standard.tolerance_cents);
    }

    #[test]
    fn parse_partial_json() {
        // Unspecified fields should be defaults
        let json = r#"{
            "display_duration_ms": 3000,
            "matching": { "profiles": { "compact": { "clarity_threshold": 0.6, "tolerance_cents": 40.0 } } }
        }"#;
        let cfg = TrainerConfig::from_json(json).unwrap();
        assert_eq!(cfg.display_duration_ms, 3000);
        assert_eq!(cfg.stability_threshold_ms, 100);
        assert_eq!(cfg.matching.profiles.compact.clarity_threshold, 0.6);
        assert_eq!(cfg.matching.profiles.standard.clarity_threshold, 0.80);
        assert_eq!(cfg.matching.low_register.max_octave, 3);
    }

    #[test]
    fn profile_names_are_lowercase() {
        let json = serde_json::to_string(&DeviceProfile::Compact).unwrap();
        assert_eq!(json, "\"compact\"");
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = TrainerConfig::default();
        cfg.clef_switch_probability = 1.5;
        assert!(matches!(cfg.validate(), Err(TrainerError::InvalidConfig(_))));

        let mut cfg = TrainerConfig::default();
        cfg.matching.profiles.compact.clarity_threshold = -0.1;
        assert!(matches!(cfg.validate(), Err(TrainerError::InvalidConfig(_))));

        let mut cfg = TrainerConfig::default();
        cfg.matching.profiles.standard.tolerance_cents = 0.0;
        assert!(matches!(cfg.validate(), Err(TrainerError::InvalidConfig(_))));

        assert!(matches!(
            TrainerConfig::from_json(r#"{ "display_duration_ms": 0 }"#),
            Err(TrainerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            TrainerConfig::from_json("{ not json"),
            Err(TrainerError::ConfigParse(_))
        ));
    }

    #[test]
    fn save_and_load_through_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("trainer.json");

        let mut cfg = TrainerConfig::default();
        cfg.stability_threshold_ms = 150;
        cfg.save(&path).unwrap();

        let loaded = TrainerConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = TrainerConfig::load(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(loaded, TrainerConfig::default());
    }
}
