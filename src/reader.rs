use crate::completion;
use crate::terminal::{Key, KeySource, Screen};
use log::{trace, warn};
use std::io::{self, Write};
use std::path::Path;

/// Turns single key presses into finished command lines.
///
/// The reader owns the edit buffer. Every change to it is drawn on the [`Screen`]
/// before the next key is read, so what the user sees always matches the buffer.
pub struct LineReader<K> {
    keys: K,
    buffer: String,
}

impl<K: KeySource> LineReader<K> {
    pub fn new(keys: K) -> Self {
        Self {
            keys,
            buffer: String::new(),
        }
    }

    /// Draw `prompt` and read one line.
    ///
    /// Returns `Ok(None)` once the input has ended, as opposed to `Ok(Some(""))` for an
    /// empty line. Errors come from Tab completion or from drawing; a terminal that
    /// cannot be switched to raw mode or a failing key source counts as the end of input.
    pub fn read_line<W: Write>(
        &mut self,
        screen: &mut Screen<W>,
        prompt: &str,
        cwd: &Path,
    ) -> io::Result<Option<String>> {
        self.buffer.clear();
        screen.echo(prompt)?;
        let _raw = match self.keys.raw_mode() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("terminal refused raw mode, treating as end of input: {}", e);
                return Ok(None);
            }
        };

        loop {
            let key = match self.keys.next_key() {
                Ok(Some(key)) => key,
                Ok(None) => return Ok(None),
                Err(e) => {
                    warn!("reading keys failed, treating as end of input: {}", e);
                    return Ok(None);
                }
            };
            trace!("key {:?}", key);

            match key {
                Key::Char(c) => {
                    self.buffer.push(c);
                    let mut utf8 = [0u8; 4];
                    screen.echo(c.encode_utf8(&mut utf8))?;
                }
                Key::Backspace => {
                    if self.buffer.pop().is_some() {
                        screen.erase_back()?;
                    }
                }
                Key::Enter => {
                    screen.newline()?;
                    return Ok(Some(std::mem::take(&mut self.buffer)));
                }
                Key::Tab => completion::complete(&mut self.buffer, cwd, prompt, screen)?,
            }
        }
    }

    /// The line being composed.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }
}
