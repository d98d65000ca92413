//! Tab completion for the directory argument of `cd`.
//!
//! Only a buffer whose trimmed text starts with `cd ` (any case) is completed. The
//! typed argument is split into a directory to search and a name prefix; immediate
//! subdirectories whose names start with that prefix, ignoring case, are candidates.
//! Candidates come in directory enumeration order.

use crate::terminal::Screen;
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::{self, Path, PathBuf};

const CD_PREFIX: &str = "cd ";

/// Outcome of looking up completions for an edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The buffer is not a `cd` command.
    NotApplicable,
    NoMatch,
    /// Exactly one candidate; holds the text to append to the buffer.
    Unique(String),
    /// Several candidates; holds their names.
    Ambiguous(Vec<String>),
}

/// Compute the completion for `buffer` relative to `cwd`.
///
/// Reading the directory to search can fail; the error is returned untouched.
pub fn lookup(buffer: &str, cwd: &Path) -> io::Result<Completion> {
    let Some(arg) = cd_argument(buffer) else {
        return Ok(Completion::NotApplicable);
    };
    let target = SearchTarget::resolve(arg, cwd);
    let mut names = matching_dirs(&target.base, &target.pattern)?;
    debug!(
        "completing {:?} in {}: {} candidate(s)",
        target.pattern,
        target.base.display(),
        names.len()
    );

    Ok(match names.len() {
        0 => Completion::NoMatch,
        1 => {
            let name = names.remove(0);
            let mut suffix = String::new();
            if target.needs_separator {
                suffix.push(path::MAIN_SEPARATOR);
            }
            let rest = strip_prefix_ignore_case(&name, &target.pattern).unwrap_or_default();
            suffix.push_str(rest);
            Completion::Unique(suffix)
        }
        _ => Completion::Ambiguous(names),
    })
}

/// Complete `buffer` in place and draw the result.
///
/// A unique candidate is appended to the buffer and echoed. Several candidates are
/// listed one per line, indented, and then `prompt` and the untouched buffer are
/// drawn again so editing continues on a line that matches the buffer.
pub fn complete<W: Write>(
    buffer: &mut String,
    cwd: &Path,
    prompt: &str,
    screen: &mut Screen<W>,
) -> io::Result<()> {
    match lookup(buffer, cwd)? {
        Completion::NotApplicable | Completion::NoMatch => {}
        Completion::Unique(suffix) => {
            buffer.push_str(&suffix);
            screen.echo(&suffix)?;
        }
        Completion::Ambiguous(names) => {
            screen.newline()?;
            for name in &names {
                screen.echo("  ")?;
                screen.echo(name)?;
                screen.newline()?;
            }
            screen.echo(prompt)?;
            screen.echo(buffer)?;
        }
    }
    Ok(())
}

fn cd_argument(buffer: &str) -> Option<&str> {
    let text = buffer.trim();
    let head = text.get(..CD_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(CD_PREFIX) {
        return None;
    }
    Some(text[CD_PREFIX.len()..].trim())
}

struct SearchTarget {
    base: PathBuf,
    pattern: String,
    /// The argument names a directory but lacks a trailing separator.
    needs_separator: bool,
}

impl SearchTarget {
    fn resolve(arg: &str, cwd: &Path) -> Self {
        if arg.is_empty() {
            return Self {
                base: cwd.to_path_buf(),
                pattern: String::new(),
                needs_separator: false,
            };
        }

        let full = cwd.join(arg);
        if full.is_dir() {
            return Self {
                base: full,
                pattern: String::new(),
                needs_separator: !arg.ends_with(path::is_separator),
            };
        }

        let (base, pattern) = match arg.rfind(path::is_separator) {
            Some(idx) => (cwd.join(&arg[..=idx]), &arg[idx + 1..]),
            None => (cwd.to_path_buf(), arg),
        };
        Self {
            base,
            pattern: pattern.to_owned(),
            needs_separator: false,
        }
    }
}

fn matching_dirs(base: &Path, pattern: &str) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if strip_prefix_ignore_case(&name, pattern).is_some() {
            names.push(name);
        }
    }
    Ok(names)
}

/// Strip `prefix` from `name`, comparing char by char ignoring case.
///
/// The remainder is cut at the matched position in `name` itself, so chars whose
/// lowercase form is longer than one char never shift the suffix.
fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = name.char_indices();
    for p in prefix.chars() {
        let (_, n) = rest.next()?;
        if !n.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str())
}
