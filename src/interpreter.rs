use crate::command::{CommandFactory, Flow};
use crate::env::Environment;
use crate::reader::LineReader;
use crate::terminal::{KeySource, Screen};
use log::{debug, info};
use std::io::Write;

/// Stateless [`CommandFactory`] for the command type `T`.
///
/// Implemented for every built-in and for `ExternalCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Dispatches command lines to built-ins or external programs and drives the
/// read-eval loop.
///
/// The interpreter owns the session [`Environment`] and an ordered list of
/// [`CommandFactory`] objects; the first factory that recognises a command name
/// handles it. See [`Default`] for the table used by the shell.
///
/// Example
/// ```
/// use minishell::Interpreter;
/// use minishell::command::Flow;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// assert_eq!(sh.dispatch("exit", &mut out).unwrap(), Flow::Exit);
/// assert_eq!(out, b"Good Bye!\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    /// Replace the session state, e.g. to start somewhere other than the process cwd.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run one finalized line.
    ///
    /// The trimmed line is split on single spaces into a command name and its
    /// arguments; no quoting or escaping is recognised. Every non-empty line except
    /// `history` itself goes into the history before the command runs.
    pub fn dispatch(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let mut parts = line.split(' ');
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        self.env.history.record(name, line);

        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, &args) {
                debug!("dispatching {:?} with {} argument(s)", name, args.len());
                return cmd.execute(stdout, &mut self.env);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// The read-eval loop.
    ///
    /// Reads lines from `reader` until the input ends or `exit` runs. Errors from a
    /// single iteration are printed as `Error: <message>` and the loop goes on; only a
    /// failure to write to `screen` ends it early.
    pub fn repl<K: KeySource, W: Write>(
        &mut self,
        reader: &mut LineReader<K>,
        screen: &mut Screen<W>,
    ) -> anyhow::Result<()> {
        info!("session started in {}", self.env.current_dir.display());
        loop {
            let prompt = self.env.prompt();
            let line = match reader.read_line(screen, &prompt, &self.env.current_dir) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("end of input");
                    break;
                }
                Err(e) => {
                    writeln!(screen)?;
                    writeln!(screen, "Error: {}", e)?;
                    continue;
                }
            };

            match self.dispatch(&line, screen) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => writeln!(screen, "Error: {:#}", e)?,
            }
            screen.flush()?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the shell's command table, in matching order:
    /// `exit`, `cls`, `help`, `history`, `pwd`, `ls`, `cat`, `cd`, then the external
    /// command launcher for everything else.
    fn default() -> Self {
        use crate::builtin::{self, Cat, Cd, Cls, Exit, Help, Ls, Pwd};
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cls>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<builtin::History>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Ls>::default()),
            Box::new(Factory::<Cat>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{ByteKeys, LineEnding};
    use std::fs;
    use std::io::Cursor;

    fn shell_in(dir: &std::path::Path) -> Interpreter {
        Interpreter::default().with_env(Environment::with_dir(dir))
    }

    fn run_script(sh: &mut Interpreter, script: &str) -> String {
        let mut reader = LineReader::new(ByteKeys::new(Cursor::new(script.as_bytes().to_vec())));
        let mut screen = Screen::new(Vec::new(), LineEnding::Lf);
        sh.repl(&mut reader, &mut screen).unwrap();
        String::from_utf8(screen.into_inner()).unwrap()
    }

    #[test]
    fn test_history_skips_history_command() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());
        let mut out = Vec::new();

        for line in ["pwd", "history", "HISTORY", "  help  ", "History"] {
            sh.dispatch(line, &mut out).unwrap();
        }

        assert_eq!(sh.env().history.entries(), &["pwd", "help"]);
    }

    #[test]
    fn test_history_output() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());
        let mut out = Vec::new();
        sh.dispatch("help", &mut out).unwrap();
        sh.dispatch("history", &mut out).unwrap();

        let mut out = Vec::new();
        sh.dispatch("history", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "help\n");
    }

    #[test]
    fn test_empty_line_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());
        let mut out = Vec::new();

        assert_eq!(sh.dispatch("   ", &mut out).unwrap(), Flow::Continue);
        assert!(out.is_empty());
        assert!(sh.env().history.is_empty());
    }

    #[test]
    fn test_builtins_match_ignoring_case() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());
        let mut out = Vec::new();

        sh.dispatch("PwD", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", tmp.path().display())
        );

        let mut out = Vec::new();
        assert_eq!(sh.dispatch("EXIT", &mut out).unwrap(), Flow::Exit);
    }

    #[test]
    fn test_without_external_factory_unknown_is_error() {
        let mut sh = Interpreter::new(vec![]).with_env(Environment::with_dir("/"));
        let err = sh.dispatch("frobnicate now", &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "command not found: frobnicate");
        assert_eq!(sh.env().history.entries(), &["frobnicate now"]);
    }

    #[test]
    fn test_repl_runs_until_exit() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("note.txt"), "hi\n").unwrap();
        let mut sh = shell_in(tmp.path());

        let out = run_script(&mut sh, "cat note.txt\ncat missing.txt\nexit\npwd\n");

        let label = tmp.path().file_name().unwrap().to_string_lossy().into_owned();
        let prompt = format!("{}> ", label);
        assert_eq!(
            out,
            format!(
                "{p}cat note.txt\nhi\n{p}cat missing.txt\ncat: missing.txt: No such file\n{p}exit\nGood Bye!\n",
                p = prompt
            )
        );
    }

    #[test]
    fn test_repl_stops_at_end_of_input() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());

        let out = run_script(&mut sh, "help\n");

        assert!(out.contains("Built-ins:"));
        assert!(!out.contains("Good Bye!"));
        assert_eq!(sh.env().history.entries(), &["help"]);
    }

    #[test]
    fn test_repl_reports_completion_error_and_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());

        let out = run_script(&mut sh, "cd nowhere/x\t\nexit\n");

        assert!(out.contains("\nError: "));
        assert!(out.ends_with("Good Bye!\n"));
        assert!(sh.env().history.entries().iter().all(|l| l != "cd nowhere/x"));
    }

    struct HungUpTerminal;

    impl crate::terminal::KeySource for HungUpTerminal {
        fn next_key(&mut self) -> std::io::Result<Option<crate::terminal::Key>> {
            Ok(None)
        }

        fn raw_mode(&mut self) -> std::io::Result<Option<crate::terminal::RawMode>> {
            Err(std::io::Error::other("terminal hung up"))
        }
    }

    #[test]
    fn test_repl_exits_when_terminal_refuses_raw_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sh = shell_in(tmp.path());
        let mut reader = LineReader::new(HungUpTerminal);
        let mut screen = Screen::new(Vec::new(), LineEnding::Lf);

        sh.repl(&mut reader, &mut screen).unwrap();

        let out = String::from_utf8(screen.into_inner()).unwrap();
        assert!(!out.contains("Error:"));
        assert_eq!(out.matches("> ").count(), 1);
    }

    #[test]
    fn test_repl_lists_ambiguous_candidates() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("proj-alpha")).unwrap();
        fs::create_dir(tmp.path().join("proj-beta")).unwrap();
        let mut sh = shell_in(tmp.path());

        let out = run_script(&mut sh, "cd proj\t\n");

        let label = tmp.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(out.contains("  proj-alpha\n"));
        assert!(out.contains("  proj-beta\n"));
        assert!(out.contains(&format!("\n{}> cd proj", label)));
    }
}
