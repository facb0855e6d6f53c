use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scrip")]
#[command(version, about = "Track recurring commitments and their streaks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the database and config.yaml
    #[arg(long, global = true, env = "SCRIP_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Database file inside the data directory, or ":memory:"
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and an empty store
    Init,

    /// Add a new scrip
    Add {
        /// Scrip name
        name: String,

        /// Longer description
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Type tag (can be specified multiple times; the first is shown)
        #[arg(long = "type", short = 't', default_value = "daily")]
        kinds: Vec<String>,

        /// First day, YYYY-MM-DD or "today"
        #[arg(long, value_parser = parse_day)]
        start: NaiveDate,

        /// Last day, YYYY-MM-DD or "today"
        #[arg(long, value_parser = parse_day)]
        end: NaiveDate,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all scrips, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one scrip with its streak
    Get {
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of a scrip
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        /// Replace the type tags (can be specified multiple times)
        #[arg(long = "type", short = 't')]
        kinds: Vec<String>,

        #[arg(long, value_parser = parse_day)]
        start: Option<NaiveDate>,

        #[arg(long, value_parser = parse_day)]
        end: Option<NaiveDate>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a scrip
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Mark a day, or unmark it if it has no note
    Mark {
        id: i64,

        /// Day, YYYY-MM-DD or "today"
        #[arg(value_parser = parse_day)]
        date: NaiveDate,
    },

    /// Show or edit the note of a marked day
    Note {
        id: i64,

        /// Day, YYYY-MM-DD or "today"
        #[arg(value_parser = parse_day)]
        date: NaiveDate,

        /// New note text
        #[arg(conflicts_with = "stdin")]
        text: Option<String>,

        /// Type the note line by line; saved as you go and on EOF or Ctrl-C
        #[arg(long)]
        stdin: bool,
    },

    /// Write all rows to a JSON file
    Export {
        /// Destination file (prompted for when omitted)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace all rows with those of an exported JSON file
    Import {
        /// Source file (prompted for when omitted)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
    },
}

pub fn parse_day(s: &str) -> Result<NaiveDate, String> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day("2024-01-05"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert_eq!(parse_day("Today"), Ok(Local::now().date_naive()));
        assert!(parse_day("05/01/2024").is_err());
    }

    #[test]
    fn test_add_defaults_to_daily() {
        let cli = Cli::parse_from([
            "scrip", "add", "Read", "--start", "2024-01-01", "--end", "2024-01-31",
        ]);
        match cli.command {
            Commands::Add { kinds, description, .. } => {
                assert_eq!(kinds, vec!["daily".to_string()]);
                assert_eq!(description, "");
            }
            other => panic!("Expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_note_text_conflicts_with_stdin() {
        let result = Cli::try_parse_from(["scrip", "note", "1", "2024-01-01", "hi", "--stdin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["scrip", "list", "--database", ":memory:", "-v"]);
        assert_eq!(cli.database.as_deref(), Some(":memory:"));
        assert!(cli.verbose);
    }
}
