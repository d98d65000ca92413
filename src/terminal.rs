//! Terminal plumbing: where keystrokes come from and how edits are drawn.
//!
//! Keys arrive through a [`KeySource`]. On a real terminal that is [`TerminalKeys`],
//! which reads raw key events through `crossterm`; when standard input is a pipe or a
//! file, [`ByteKeys`] decodes the same key classes out of the byte stream. Output of
//! the line editor goes through a [`Screen`], which knows which line ending the
//! terminal needs in its current mode.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Key classes the line reader reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Tab,
}

/// A blocking supply of key presses.
pub trait KeySource {
    /// Block until the next recognised key. `Ok(None)` means the input has ended.
    fn next_key(&mut self) -> io::Result<Option<Key>>;

    /// Put the terminal into the mode this source needs while a line is read.
    ///
    /// The returned guard restores the terminal when dropped. Sources that read
    /// cooked input need nothing and return `Ok(None)`.
    fn raw_mode(&mut self) -> io::Result<Option<RawMode>> {
        Ok(None)
    }
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn next_key(&mut self) -> io::Result<Option<Key>> {
        (**self).next_key()
    }

    fn raw_mode(&mut self) -> io::Result<Option<RawMode>> {
        (**self).raw_mode()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Decoded {
    Key(Key),
    EndOfInput,
    Ignored,
}

/// Key events read from an interactive terminal.
///
/// Raw mode swallows the usual signal keys, so Ctrl-C and Ctrl-D both end the input.
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<Key>> {
        loop {
            let Event::Key(key_event) = event::read()? else {
                continue;
            };
            match decode_key_event(key_event) {
                Decoded::Key(key) => return Ok(Some(key)),
                Decoded::EndOfInput => return Ok(None),
                Decoded::Ignored => {}
            }
        }
    }

    fn raw_mode(&mut self) -> io::Result<Option<RawMode>> {
        RawMode::enable().map(Some)
    }
}

fn decode_key_event(key_event: KeyEvent) -> Decoded {
    if key_event.kind == KeyEventKind::Release {
        return Decoded::Ignored;
    }
    let modifiers = key_event.modifiers;
    match key_event.code {
        KeyCode::Char('c' | 'd') if modifiers.contains(KeyModifiers::CONTROL) => {
            Decoded::EndOfInput
        }
        KeyCode::Char(_) if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            Decoded::Ignored
        }
        KeyCode::Char(c) => Decoded::Key(Key::Char(c)),
        KeyCode::Enter => Decoded::Key(Key::Enter),
        KeyCode::Backspace => Decoded::Key(Key::Backspace),
        KeyCode::Tab => Decoded::Key(Key::Tab),
        _ => Decoded::Ignored,
    }
}

/// Keys decoded from a plain byte stream, used when standard input is not a terminal.
///
/// `\n` is Enter, `\t` is Tab, DEL and BS are Backspace and `^D` ends the input.
/// Every other control character, `\r` included, is dropped.
pub struct ByteKeys<R> {
    input: R,
    pending: VecDeque<char>,
}

impl<R: BufRead> ByteKeys<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }

    fn next_char(&mut self) -> io::Result<Option<char>> {
        if self.pending.is_empty() {
            let mut chunk = String::new();
            if self.input.read_line(&mut chunk)? == 0 {
                return Ok(None);
            }
            self.pending.extend(chunk.chars());
        }
        Ok(self.pending.pop_front())
    }
}

impl<R: BufRead> KeySource for ByteKeys<R> {
    fn next_key(&mut self) -> io::Result<Option<Key>> {
        while let Some(c) = self.next_char()? {
            match decode_char(c) {
                Decoded::Key(key) => return Ok(Some(key)),
                Decoded::EndOfInput => return Ok(None),
                Decoded::Ignored => {}
            }
        }
        Ok(None)
    }
}

fn decode_char(c: char) -> Decoded {
    match c {
        '\n' => Decoded::Key(Key::Enter),
        '\t' => Decoded::Key(Key::Tab),
        '\x7f' | '\x08' => Decoded::Key(Key::Backspace),
        '\x04' => Decoded::EndOfInput,
        c if c.is_control() => Decoded::Ignored,
        c => Decoded::Key(Key::Char(c)),
    }
}

/// Line terminator the screen emits when the line editor moves to a new line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Cooked output: the terminal adds the carriage return itself.
    Lf,
    /// Raw mode: output post-processing is off, so the carriage return is explicit.
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Output side of the line editor.
///
/// Every drawing call is flushed immediately so the visible line never lags behind
/// the edit buffer. Plain [`Write`] calls pass straight through for command output.
pub struct Screen<W> {
    out: W,
    line_ending: LineEnding,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W, line_ending: LineEnding) -> Self {
        Self { out, line_ending }
    }

    /// Draw `text` at the cursor.
    pub fn echo(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    /// Wipe the character left of the cursor: back one column, blank it, back again.
    pub fn erase_back(&mut self) -> io::Result<()> {
        self.echo("\x08 \x08")
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.echo(self.line_ending.as_str())
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Write for Screen<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Keeps the terminal in raw mode for as long as it is alive.
pub struct RawMode {
    _private: (),
}

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("could not leave raw mode: {}", e);
        }
    }
}
