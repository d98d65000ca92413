use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use crossterm::QueueableCommand;
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd". Matched ignoring case.
    fn name() -> &'static str;

    /// Executes the command, printing to `stdout`.
    ///
    /// An `Err` is reported to the user as a single line and the shell carries on.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        match <T as BuiltinCommand>::execute(*self, stdout, env) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                writeln!(stdout, "{:#}", e)?;
                Ok(Flow::Continue)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow> {
        stdout.write_all(self.output.as_bytes())?;
        if !self.output.ends_with('\n') {
            writeln!(stdout)?;
        }
        Ok(Flow::Continue)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name.eq_ignore_ascii_case(T::name()) {
            // Only a lone `--help` asks for usage; everything else is an operand,
            // even `help` or a name starting with a dash.
            let argv: Vec<&str> = match args {
                ["--help"] => args.to_vec(),
                _ => std::iter::once("--").chain(args.iter().copied()).collect(),
            };
            Some(match T::from_args(&[name], &argv) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
            })
        } else {
            None
        }
    }
}

/// Write `bytes` and make sure the output ends on a fresh line.
pub(crate) fn write_block(stdout: &mut dyn Write, bytes: &[u8]) -> std::io::Result<()> {
    stdout.write_all(bytes)?;
    if !bytes.ends_with(b"\n") {
        writeln!(stdout)?;
    }
    Ok(())
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow> {
        writeln!(stdout, "Good Bye!")?;
        Ok(Flow::Exit)
    }
}

#[derive(FromArgs)]
/// Clear the terminal screen.
pub struct Cls {}

impl BuiltinCommand for Cls {
    fn name() -> &'static str {
        "cls"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow> {
        stdout.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
        stdout.flush()?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show the built-in commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow> {
        writeln!(stdout, "Built-ins: help, exit, cd, history, cls, pwd, ls, cat")?;
        writeln!(
            stdout,
            "External commands: run like in terminal (e.g. git --version)"
        )?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the commands entered in this session, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        for line in env.history.entries() {
            writeln!(stdout, "{}", line)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List the names of the entries in a directory.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub path: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        let shown = self.path.as_deref().unwrap_or(".");
        let dir = env.current_dir.join(shown);
        let entries =
            fs::read_dir(&dir).with_context(|| format!("ls: cannot access '{}'", shown))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("ls: cannot read '{}'", shown))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        for name in names {
            writeln!(stdout, "{}", name)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the contents of files.
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print, relative to the current directory.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        if self.files.is_empty() {
            writeln!(stdout, "Usage: cat <filename>")?;
            return Ok(Flow::Continue);
        }
        for fname in &self.files {
            let path = env.current_dir.join(fname);
            if !path.is_file() {
                writeln!(stdout, "cat: {}: No such file", fname)?;
                continue;
            }
            match fs::read(&path) {
                Ok(contents) => write_block(stdout, &contents)?,
                Err(e) => writeln!(stdout, "cat: {}: {}", fname, e)?,
            }
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute, relative to the current directory, or `..`.
    /// Anything after the first operand is ignored.
    pub target: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        let target = match self.target.first().map(String::as_str) {
            Some(t) if !t.is_empty() => t,
            _ => {
                writeln!(stdout, "Usage: cd <directory-path>")?;
                return Ok(Flow::Continue);
            }
        };

        // `..` at a root has nowhere to go and stays put.
        let new_dir = normalize_lexically(&env.current_dir.join(target));
        env.change_dir(new_dir.clone())
            .with_context(|| format!("cd: can't chdir to {}", new_dir.display()))?;
        Ok(Flow::Continue)
    }
}

/// Resolve `.` and `..` without touching the filesystem, so symlinks stay as typed.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
