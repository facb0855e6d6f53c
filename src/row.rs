//! Mapping between [`Scrip`] and the flat row stored in the `scrips` table.
//!
//! `type`, `time_span` and `streak` are JSON-encoded text columns and dates are
//! written as `YYYY-MM-DD`. Reading is lenient: a malformed column is logged
//! and replaced with an empty value so one bad row cannot fail a whole load.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::{Scrip, StreakEntry, TimeSpan};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row of the `scrips` table, exactly as stored and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScripRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub time_span: Option<String>,
    #[serde(default)]
    pub streak: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A column that could not be read and was replaced by an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIssue {
    pub row_id: Option<i64>,
    pub column: &'static str,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
struct StoredStreakEntry {
    date: String,
    #[serde(default)]
    note: String,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse the calendar day at the start of `s`.
///
/// Accepts `2024-01-05`, `2024-01-05T13:00:00.000Z` and SQLite's
/// `2024-01-05 13:00:00`; anything after the date is discarded. Years
/// outside 0000-9999 carry a sign, as [`format_date`] writes them.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

pub fn to_row(scrip: &Scrip) -> ScripRow {
    let time_span: Vec<String> = scrip
        .time_span
        .map(|span| vec![format_date(span.start), format_date(span.end)])
        .unwrap_or_default();

    let streak: Vec<StoredStreakEntry> = scrip
        .streak
        .iter()
        .map(|entry| StoredStreakEntry {
            date: format_date(entry.date),
            note: entry.note.clone(),
        })
        .collect();

    ScripRow {
        id: scrip.id,
        name: scrip.name.clone(),
        description: scrip.description.clone(),
        kind: Some(encode(&scrip.kind)),
        time_span: Some(encode(&time_span)),
        streak: Some(encode(&streak)),
        created_at: Some(format_date(scrip.created_at)),
    }
}

// Vec<String> and plain structs of strings never fail to encode.
fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

pub fn from_row(row: &ScripRow) -> Scrip {
    let (scrip, issues) = from_row_with_issues(row);
    for issue in &issues {
        warn!(
            row_id = ?issue.row_id,
            column = issue.column,
            "malformed column, using empty value: {}",
            issue.message
        );
    }
    scrip
}

/// Like [`from_row`], but hands back the degraded columns instead of logging them.
pub fn from_row_with_issues(row: &ScripRow) -> (Scrip, Vec<ColumnIssue>) {
    let mut issues = Vec::new();
    let mut report = |column: &'static str, message: String| {
        issues.push(ColumnIssue {
            row_id: row.id,
            column,
            message,
        });
    };

    let kind = match decode::<Vec<String>>(row.kind.as_deref()) {
        Ok(kind) => kind.unwrap_or_default(),
        Err(e) => {
            report("type", e);
            Vec::new()
        }
    };

    let time_span = match decode::<Vec<String>>(row.time_span.as_deref()) {
        Ok(None) => None,
        Ok(Some(dates)) if dates.is_empty() => None,
        Ok(Some(dates)) => match parse_span(&dates) {
            Ok(span) => Some(span),
            Err(e) => {
                report("time_span", e);
                None
            }
        },
        Err(e) => {
            report("time_span", e);
            None
        }
    };

    let streak = match decode::<Vec<StoredStreakEntry>>(row.streak.as_deref()) {
        Ok(entries) => match parse_streak(entries.unwrap_or_default()) {
            Ok(streak) => streak,
            Err(e) => {
                report("streak", e);
                Vec::new()
            }
        },
        Err(e) => {
            report("streak", e);
            Vec::new()
        }
    };

    let created_at = match row.created_at.as_deref().map(|s| (s, parse_date(s))) {
        Some((_, Some(date))) => date,
        Some((raw, None)) => {
            report("created_at", format!("not a calendar date: '{}'", raw));
            NaiveDate::default()
        }
        None => {
            report("created_at", "missing".to_string());
            NaiveDate::default()
        }
    };

    let scrip = Scrip {
        id: row.id,
        name: row.name.clone(),
        description: row.description.clone(),
        kind,
        time_span,
        streak,
        created_at,
    };
    (scrip, issues)
}

/// Decode a JSON column. Missing and blank columns are `Ok(None)`.
fn decode<T: for<'de> Deserialize<'de>>(column: Option<&str>) -> Result<Option<T>, String> {
    match column.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text).map(Some).map_err(|e| e.to_string()),
    }
}

fn parse_span(dates: &[String]) -> Result<TimeSpan, String> {
    match dates {
        [start, end] => {
            let start = parse_date(start).ok_or_else(|| format!("bad start date '{}'", start))?;
            let end = parse_date(end).ok_or_else(|| format!("bad end date '{}'", end))?;
            Ok(TimeSpan::new(start, end))
        }
        _ => Err(format!("expected 2 dates, found {}", dates.len())),
    }
}

fn parse_streak(entries: Vec<StoredStreakEntry>) -> Result<Vec<StreakEntry>, String> {
    entries
        .into_iter()
        .map(|entry| {
            parse_date(&entry.date)
                .map(|date| StreakEntry::with_note(date, entry.note))
                .ok_or_else(|| format!("bad streak date '{}'", entry.date))
        })
        .collect()
}
