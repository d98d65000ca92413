use crate::builtin::write_block;
use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use log::debug;
use std::ffi::OsString;
use std::io::Write;
use std::process::{Command, Stdio};

/// Command that is not a builtin.
///
/// The program runs in the session's working directory with its standard output and
/// standard error captured. Once it has exited, captured stdout is printed, then
/// captured stderr.
pub struct ExternalCommand {
    name: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<OsString>, args: Vec<OsString>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// The catch-all factory: any name is tried as a program, so it must come last.
impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        // Runs of spaces leave empty tokens behind; they are not arguments.
        let args = args
            .iter()
            .filter(|arg| !arg.is_empty())
            .map(OsString::from)
            .collect();
        Some(Box::new(ExternalCommand::new(name, args)))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        let spawned = Command::new(&self.name)
            .args(&self.args)
            .current_dir(&env.current_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                debug!("spawning {:?} failed: {}", self.name, e);
                writeln!(stdout, "Command not found: {}", self.name.to_string_lossy())?;
                return Ok(Flow::Continue);
            }
        };

        // Drains both pipes at once and reaps the child.
        let output = child.wait_with_output()?;
        debug!("{:?} exited with {}", self.name, output.status);

        if !output.stdout.is_empty() {
            write_block(stdout, &output.stdout)?;
        }
        if !output.stderr.is_empty() {
            write_block(stdout, &output.stderr)?;
        }
        Ok(Flow::Continue)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn run(name: &str, args: &[&str]) -> (Flow, String) {
        let mut env = Environment::with_dir(std::env::temp_dir());
        let cmd = Factory::<ExternalCommand>::default()
            .try_create(&env, name, args)
            .expect("external factory accepts every name");
        let mut out = Vec::new();
        let flow = cmd.execute(&mut out, &mut env).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_captures_stdout() {
        let (flow, out) = run("echo", &["hello", "", "world"]);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "hello world\n");
    }

    #[test]
    fn test_stdout_printed_before_stderr() {
        let (_, out) = run("sh", &["-c", "echo err >&2; printf out"]);
        assert_eq!(out, "out\nerr\n");
    }

    #[test]
    fn test_silent_program_prints_nothing() {
        let (flow, out) = run("true", &[]);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "");
    }

    #[test]
    fn test_missing_program_is_reported() {
        let (flow, out) = run("definitely-not-a-real-program-xyz", &[]);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "Command not found: definitely-not-a-real-program-xyz\n");
    }

    #[test]
    fn test_large_stderr_does_not_deadlock() {
        let (_, out) = run(
            "sh",
            &["-c", "head -c 300000 /dev/zero | tr '\\0' x >&2; echo done"],
        );
        assert!(out.starts_with("done\n"));
        assert!(out.len() > 300000);
    }

    #[test]
    fn test_runs_in_session_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let canonical = std::fs::canonicalize(tmp.path()).unwrap();
        let mut env = Environment::with_dir(&canonical);
        let cmd = ExternalCommand::new("pwd", vec![]);
        let mut out = Vec::new();
        Box::new(cmd).execute(&mut out, &mut env).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", canonical.display())
        );
    }
}
