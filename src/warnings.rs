//! Data-quality warnings for scrips.
//!
//! These are reported to the user but never corrected: a scrip with a
//! reversed time span or duplicate streak days is still stored as given.

use chrono::NaiveDate;

use crate::entity::Scrip;

/// Something odd about a stored scrip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Time span ends before it starts.
    ReversedTimeSpan {
        id: Option<i64>,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Time span column could not be read.
    MissingTimeSpan { id: Option<i64> },
    /// No category tag.
    MissingType { id: Option<i64> },
    /// More than one streak entry on the same day.
    DuplicateStreakDay { id: Option<i64>, date: NaiveDate },
}

/// Check one scrip and return any warnings.
pub fn check_scrip(scrip: &Scrip) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let id = scrip.id;

    match scrip.time_span {
        Some(span) if !span.is_ordered() => warnings.push(Warning::ReversedTimeSpan {
            id,
            start: span.start,
            end: span.end,
        }),
        Some(_) => {}
        None => warnings.push(Warning::MissingTimeSpan { id }),
    }

    if scrip.kind.is_empty() {
        warnings.push(Warning::MissingType { id });
    }

    let mut seen: Vec<NaiveDate> = Vec::with_capacity(scrip.streak.len());
    for entry in &scrip.streak {
        if seen.contains(&entry.date) {
            let already = warnings
                .iter()
                .any(|w| matches!(w, Warning::DuplicateStreakDay { date, .. } if *date == entry.date));
            if !already {
                warnings.push(Warning::DuplicateStreakDay {
                    id,
                    date: entry.date,
                });
            }
        } else {
            seen.push(entry.date);
        }
    }

    warnings
}

/// Check every scrip in a collection.
pub fn check_all(scrips: &[Scrip]) -> Vec<Warning> {
    scrips.iter().flat_map(check_scrip).collect()
}

fn label(id: &Option<i64>) -> String {
    id.map(|id| format!("scrip {:03}", id))
        .unwrap_or_else(|| "unsaved scrip".to_string())
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::ReversedTimeSpan { id, start, end } => format!(
            "Warning: {} ends ({}) before it starts ({})",
            label(id),
            end,
            start
        ),
        Warning::MissingTimeSpan { id } => {
            format!("Warning: {} has no readable time span", label(id))
        }
        Warning::MissingType { id } => format!("Warning: {} has no type", label(id)),
        Warning::DuplicateStreakDay { id, date } => format!(
            "Warning: {} has more than one streak entry on {}",
            label(id),
            date
        ),
    }
}
