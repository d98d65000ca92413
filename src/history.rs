/// Append-only log of accepted command lines for one shell session.
///
/// Entries are kept in insertion order and never deduplicated or pruned. The
/// `history` command itself is never recorded, whatever its case.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `line` unless `command` is the `history` built-in.
    ///
    /// Returns whether the line was stored.
    pub fn record(&mut self, command: &str, line: &str) -> bool {
        if command.eq_ignore_ascii_case("history") {
            return false;
        }
        self.entries.push(line.to_owned());
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_keeps_insertion_order_and_duplicates() {
        let mut history = History::new();
        history.record("pwd", "pwd");
        history.record("ls", "ls /tmp");
        history.record("pwd", "pwd");

        assert_eq!(history.entries(), &["pwd", "ls /tmp", "pwd"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_history_never_stores_itself() {
        let mut history = History::new();
        assert!(!history.record("history", "history"));
        assert!(!history.record("HISTORY", "HISTORY"));
        assert!(!history.record("History", "History extra"));
        assert!(history.is_empty());
    }
}
