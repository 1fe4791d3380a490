//! Static scale table.
//!
//! Seven major scales keyed by root name. Degree labels are kept as text
//! because that is what the table is defined in terms of; [`Scale::midi_note`]
//! turns a degree into a concrete pitch for exporters that want one.

use crate::error::{Error, Result};

/// Number of degrees in every scale of the table.
pub const DEGREES: usize = 7;

/// A seven-degree scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    root: &'static str,
    degrees: [&'static str; DEGREES],
}

static SCALES: [Scale; 7] = [
    Scale {
        root: "C",
        degrees: ["C", "D", "E", "F", "G", "A", "B"],
    },
    Scale {
        root: "G",
        degrees: ["G", "A", "B", "C", "D", "E", "F#"],
    },
    Scale {
        root: "D",
        degrees: ["D", "E", "F#", "G", "A", "B", "C#"],
    },
    Scale {
        root: "A",
        degrees: ["A", "B", "C#", "D", "E", "F#", "G#"],
    },
    Scale {
        root: "E",
        degrees: ["E", "F#", "G#", "A", "B", "C#", "D#"],
    },
    Scale {
        root: "B",
        degrees: ["B", "C#", "D#", "E", "F#", "G#", "A#"],
    },
    Scale {
        root: "F",
        degrees: ["F", "G", "A", "Bb", "C", "D", "E"],
    },
];

/// Read-only lookup over the process-wide scale table.
pub struct ScaleTable;

impl ScaleTable {
    /// Look up a scale by root name (exact match, e.g. `"C"`, `"F"`).
    pub fn get(root: &str) -> Option<&'static Scale> {
        SCALES.iter().find(|s| s.root == root)
    }

    /// Like [`get`](Self::get) but fails with [`Error::UnknownScale`].
    pub fn lookup(root: &str) -> Result<&'static Scale> {
        Self::get(root).ok_or_else(|| Error::UnknownScale(root.to_string()))
    }

    pub fn roots() -> impl Iterator<Item = &'static str> {
        SCALES.iter().map(|s| s.root)
    }

    pub fn contains(root: &str) -> bool {
        Self::get(root).is_some()
    }
}

impl Scale {
    pub fn root(&self) -> &'static str {
        self.root
    }

    pub fn degrees(&self) -> &[&'static str; DEGREES] {
        &self.degrees
    }

    /// MIDI note number for `degree` (wrapped into 0..7) with the root placed
    /// in `octave` (C4 = 60). Degrees climb upward from the root, so a degree
    /// whose pitch class sits below the root's lands in the next octave.
    ///
    /// Returns `None` if the result is outside 0..=127.
    pub fn midi_note(&self, degree: usize, octave: i8) -> Option<u8> {
        let root_pc = pitch_class(self.root)?;
        let pc = pitch_class(self.degrees[degree % DEGREES])?;
        let wrap = if pc < root_pc { 12 } else { 0 };
        let note = 12 * (octave as i32 + 1) + pc as i32 + wrap;
        u8::try_from(note).ok().filter(|n| *n <= 127)
    }
}

fn pitch_class(label: &str) -> Option<u8> {
    let mut chars = label.chars();
    let base = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let pc = match chars.as_str() {
        "" => base,
        "#" => base + 1,
        "b" => base + 11,
        _ => return None,
    };
    Some(pc % 12)
}
