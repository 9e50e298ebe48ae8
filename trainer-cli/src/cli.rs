use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use trainer_core::{ClefSelection, DeviceProfile, SessionOptions};

#[derive(Parser, Debug)]
#[command(name = "note-trainer")]
#[command(about = "Sight-reading trainer: sing or play the note on the staff")]
pub struct Cli {
    /// Clefs to draw notes from
    #[arg(long, value_enum, default_value_t = ClefArg::Treble)]
    pub clef: ClefArg,

    /// Matching profile for the input device
    #[arg(long, value_enum, default_value_t = ProfileArg::Standard)]
    pub profile: ProfileArg,

    /// Show note names (learning mode)
    #[arg(long)]
    pub reveal: bool,

    /// Trainer configuration file (JSON); defaults are used when absent
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(long)]
    pub seconds: Option<u64>,

    /// Print events as JSON lines instead of text
    #[arg(long)]
    pub json: bool,

    /// Seed for reproducible note sequences
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the default configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    pub write_default_config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClefArg {
    Treble,
    Bass,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Standard,
    /// Phones and built-in laptop microphones
    Compact,
}

impl From<ClefArg> for ClefSelection {
    fn from(arg: ClefArg) -> Self {
        match arg {
            ClefArg::Treble => ClefSelection::Treble,
            ClefArg::Bass => ClefSelection::Bass,
            ClefArg::Both => ClefSelection::Both,
        }
    }
}

impl From<ProfileArg> for DeviceProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Standard => DeviceProfile::Standard,
            ProfileArg::Compact => DeviceProfile::Compact,
        }
    }
}

impl Cli {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            clefs: self.clef.into(),
            profile: self.profile.into(),
            reveal_note_names: self.reveal,
        }
    }
}
