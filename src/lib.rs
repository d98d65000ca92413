//! A small interactive command shell.
//!
//! The shell reads one line at a time straight from the keyboard, offers Tab completion
//! for the argument of `cd`, runs a fixed set of built-in commands in-process and hands
//! everything else to the operating system as an external program whose output is
//! captured and printed.
//!
//! The main entry point is [`Interpreter`], which owns the session [`env::Environment`]
//! and dispatches finalized lines. Keystrokes are turned into lines by
//! [`reader::LineReader`], fed by any [`terminal::KeySource`].

mod builtin;
pub mod command;
pub mod completion;
pub mod env;
mod external;
pub mod history;
mod interpreter;
pub mod logger;
pub mod reader;
pub mod terminal;

#[cfg(test)]
mod test_support;

/// Just a convenient re-export of the command dispatcher and read-eval loop.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
