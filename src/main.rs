use argh::FromArgs;
use log::LevelFilter;
use minishell::Interpreter;
use minishell::reader::LineReader;
use minishell::terminal::{ByteKeys, KeySource, LineEnding, Screen, TerminalKeys};
use std::io::{self, IsTerminal};

#[derive(FromArgs)]
/// A minimal interactive command shell.
struct Options {
    #[argh(option, default = "LevelFilter::Warn")]
    /// diagnostics written to stderr: off, error, warn, info, debug or trace.
    log_level: LevelFilter,

    #[argh(switch)]
    /// do not print the welcome line on start.
    no_banner: bool,
}

fn main() -> anyhow::Result<()> {
    let options: Options = argh::from_env();
    minishell::logger::init(options.log_level)?;

    let interactive = io::stdin().is_terminal();
    let (keys, line_ending): (Box<dyn KeySource>, _) = if interactive {
        (Box::new(TerminalKeys), LineEnding::CrLf)
    } else {
        (Box::new(ByteKeys::new(io::stdin().lock())), LineEnding::Lf)
    };

    let mut screen = Screen::new(io::stdout(), line_ending);
    if !options.no_banner {
        screen.echo("Welcome to MiniShell. Type 'help' for commands.\n")?;
    }

    let mut reader = LineReader::new(keys);
    Interpreter::default().repl(&mut reader, &mut screen)
}
