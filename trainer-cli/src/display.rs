//! # Event Display Module
//!
//! Terminal rendering of trainer events. Text mode draws the target on a
//! small five-line staff; JSON mode prints one object per event for
//! scripting.

use trainer_core::catalog::{Clef, Letter, Note};
use trainer_core::TrainerEvent;

/// Staff position (in diatonic steps) of each clef's bottom line.
fn bottom_line(clef: Clef) -> i32 {
    match clef {
        Clef::Treble => diatonic_index(Letter::E, 4),
        Clef::Bass => diatonic_index(Letter::G, 2),
    }
}

fn diatonic_index(letter: Letter, octave: u8) -> i32 {
    let step = Letter::ALL.iter().position(|&l| l == letter).unwrap_or(0) as i32;
    i32::from(octave) * 7 + step
}

/// Draws `note` on a staff of `clef`, top line first.
///
/// Positions are counted from the bottom line: even positions are lines,
/// odd ones spaces. Ledger lines are added as far as the note needs.
pub fn staff(note: Note, clef: Clef) -> Vec<String> {
    let position = diatonic_index(note.letter(), note.octave()) - bottom_line(clef);
    let top = position.max(8);
    let bottom = position.min(0);

    (bottom..=top)
        .rev()
        .map(|p| {
            let on_staff = (0..=8).contains(&p);
            let is_line = p % 2 == 0;
            let fill = if is_line && on_staff { '-' } else { ' ' };
            let mut row = vec![fill; 15];
            if is_line && !on_staff {
                for c in &mut row[5..10] {
                    *c = '-';
                }
            }
            if p == position {
                if note.is_sharp() {
                    row[6] = '#';
                }
                row[7] = 'o';
            }
            row.into_iter().collect::<String>().trim_end().to_string()
        })
        .collect()
}

/// Renders one event as text.
pub fn render_text(event: &TrainerEvent) -> String {
    match event {
        TrainerEvent::TargetNoteChanged {
            note,
            clef,
            reveal_name,
        } => {
            let mut out = if *reveal_name {
                format!("next note: {note} ({clef} clef, {})\n", note.key_id())
            } else {
                format!("next note ({clef} clef):\n")
            };
            for row in staff(*note, *clef) {
                out.push_str("  ");
                out.push_str(&row);
                out.push('\n');
            }
            out
        }
        TrainerEvent::KeyDetected { note, cents } => format!("  heard {note} ({cents:+.0} cents)"),
        TrainerEvent::MatchAccepted { note } => format!("  correct: {note}!"),
        TrainerEvent::InputUnavailable { message } => format!("microphone unavailable: {message}"),
        TrainerEvent::SessionStopped => "session stopped".to_string(),
    }
}

/// Renders one event as a JSON line.
pub fn render_json(event: &TrainerEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

/// Prints events to stdout in the chosen format.
///
/// Text mode only prints a detected note when it changes, since the
/// session reports one on every processed frame.
pub struct Renderer {
    json: bool,
    last_heard: Option<Note>,
}

impl Renderer {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            last_heard: None,
        }
    }

    pub fn show(&mut self, event: &TrainerEvent) -> serde_json::Result<()> {
        if self.json {
            println!("{}", render_json(event)?);
            return Ok(());
        }

        match event {
            TrainerEvent::KeyDetected { note, .. } => {
                if self.last_heard == Some(*note) {
                    return Ok(());
                }
                self.last_heard = Some(*note);
            }
            _ => self.last_heard = None,
        }
        println!("{}", render_text(event));
        Ok(())
    }
}
