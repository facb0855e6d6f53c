use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single day's completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
}

impl StreakEntry {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            note: String::new(),
        }
    }

    pub fn with_note(date: NaiveDate, note: impl Into<String>) -> Self {
        Self {
            date,
            note: note.into(),
        }
    }
}

/// Outcome of [`super::Scrip::toggle_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakToggle {
    Marked,
    Unmarked,
    KeptWithNote,
}

impl std::fmt::Display for StreakToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreakToggle::Marked => write!(f, "marked"),
            StreakToggle::Unmarked => write!(f, "unmarked"),
            StreakToggle::KeptWithNote => write!(f, "kept (has a note)"),
        }
    }
}

/// Collapse entries sharing a calendar day.
///
/// The first entry for a day keeps its position. If it has no note, the
/// first non-empty note among its duplicates is carried over.
pub fn dedupe_streak(streak: Vec<StreakEntry>) -> Vec<StreakEntry> {
    let mut out: Vec<StreakEntry> = Vec::with_capacity(streak.len());
    for entry in streak {
        match out.iter_mut().find(|e| e.date == entry.date) {
            Some(kept) => {
                if kept.note.is_empty() && !entry.note.is_empty() {
                    kept.note = entry.note;
                }
            }
            None => out.push(entry),
        }
    }
    out
}
