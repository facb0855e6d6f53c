use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::store::PathPicker;

/// File picker for the terminal.
///
/// Uses the path given on the command line, otherwise asks on stdin when it
/// is a terminal. EOF, a blank answer to the open prompt, or a
/// non-interactive stdin all mean "cancelled".
pub struct TerminalPicker {
    preset: Option<PathBuf>,
}

impl TerminalPicker {
    pub fn new(preset: Option<PathBuf>) -> Self {
        Self { preset }
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        if !atty::is(atty::Stream::Stdin) {
            return None;
        }
        eprint!("{}", prompt);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim().to_string()),
        }
    }
}

impl PathPicker for TerminalPicker {
    fn pick_save_path(&self, default_name: &str, extension: &str) -> Option<PathBuf> {
        if let Some(path) = &self.preset {
            return Some(path.clone());
        }
        let answer = self.ask(&format!("Save export to [{}]: ", default_name))?;
        let name = if answer.is_empty() {
            default_name.to_string()
        } else {
            answer
        };
        Some(with_extension(PathBuf::from(name), extension))
    }

    fn pick_open_path(&self, extension: &str) -> Option<PathBuf> {
        if let Some(path) = &self.preset {
            return Some(path.clone());
        }
        let answer = self.ask(&format!("Import from (.{} file, blank to cancel): ", extension))?;
        if answer.is_empty() {
            None
        } else {
            Some(PathBuf::from(answer))
        }
    }
}

fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(extension)
    }
}
