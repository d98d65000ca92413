use crate::history::History;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable per-session state shared by every command the interpreter runs.
///
/// The environment contains:
/// - `current_dir`: the working directory, kept in sync with the process one by `cd`.
/// - `history`: every accepted command line of the session.
///
/// Note: fields are public so commands can reach them without a wall of accessors.
#[derive(Debug, Clone)]
pub struct Environment {
    /// The current working directory for command execution and completion.
    pub current_dir: PathBuf,
    /// Lines accepted so far, oldest first.
    pub history: History,
}

impl Environment {
    /// Capture the process working directory into a fresh session with empty history.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_dir(current_dir)
    }

    /// Start a session rooted at `dir` without touching the process working directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: dir.into(),
            history: History::new(),
        }
    }

    /// Prompt shown before every line: the last component of the working directory
    /// followed by `"> "`. A filesystem root has no last component and yields `"> "`.
    pub fn prompt(&self) -> String {
        format!("{}> ", dir_label(&self.current_dir))
    }

    /// Switch both the process and the session to `dir`.
    pub fn change_dir(&mut self, dir: PathBuf) -> std::io::Result<()> {
        stdenv::set_current_dir(&dir)?;
        self.current_dir = dir;
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
