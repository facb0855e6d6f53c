mod streak;

pub use streak::{dedupe_streak, StreakEntry, StreakToggle};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Planned `[start, end]` range of a scrip.
///
/// Ordering is not enforced: `start > end` is representable and is only
/// reported by [`crate::warnings::check_scrip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// A tracked recurring commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scrip {
    /// Assigned by the store on first insert.
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    /// Category tags; only the first one is shown on the board.
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    /// `None` only when a stored row carried an unreadable span.
    pub time_span: Option<TimeSpan>,
    pub streak: Vec<StreakEntry>,
    pub created_at: NaiveDate,
}

/// Build a not-yet-persisted scrip with an empty streak.
pub fn create_scrip(
    name: impl Into<String>,
    description: impl Into<String>,
    kind: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
    created_at: NaiveDate,
) -> Scrip {
    Scrip {
        id: None,
        name: name.into(),
        description: description.into(),
        kind,
        time_span: Some(TimeSpan::new(start, end)),
        streak: Vec::new(),
        created_at,
    }
}

impl Scrip {
    /// The tag shown on the board, if any.
    pub fn primary_kind(&self) -> Option<&str> {
        self.kind.first().map(String::as_str)
    }

    pub fn entry(&self, date: NaiveDate) -> Option<&StreakEntry> {
        self.streak.iter().find(|e| e.date == date)
    }

    pub fn has_entry(&self, date: NaiveDate) -> bool {
        self.entry(date).is_some()
    }

    /// Long-press gesture on a calendar day.
    ///
    /// Unmarked days get an empty entry, marked days without a note are
    /// removed, and days carrying a note are left alone.
    pub fn toggle_day(&mut self, date: NaiveDate) -> StreakToggle {
        match self.streak.iter().position(|e| e.date == date) {
            None => {
                self.streak.push(StreakEntry::new(date));
                StreakToggle::Marked
            }
            Some(idx) if self.streak[idx].note.is_empty() => {
                self.streak.remove(idx);
                StreakToggle::Unmarked
            }
            Some(_) => StreakToggle::KeptWithNote,
        }
    }

    /// Replace the note of every entry on `date`. Returns false if the day is not marked.
    pub fn set_note(&mut self, date: NaiveDate, note: impl Into<String>) -> bool {
        let note = note.into();
        let mut found = false;
        for entry in self.streak.iter_mut().filter(|e| e.date == date) {
            entry.note = note.clone();
            found = true;
        }
        found
    }

    /// Copy of this scrip with `entry` swapped in for the entry on the same day.
    ///
    /// `None` if that day is not marked.
    pub fn with_entry(&self, entry: &StreakEntry) -> Option<Scrip> {
        if !self.has_entry(entry.date) {
            return None;
        }
        let mut updated = self.clone();
        for existing in updated.streak.iter_mut().filter(|e| e.date == entry.date) {
            *existing = entry.clone();
        }
        Some(updated)
    }
}
