use crate::error::{Error, Result};

/// A random-access character source for the JSON scanner.
///
/// Positions count characters, not bytes, so that the scanner can seek anywhere it has been
/// before.
#[derive(Debug, Clone)]
pub struct JsonBuffer {
    chars: Vec<char>,
    position: usize,
    eof: bool,
}

impl JsonBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            position: 0,
            eof: false,
        }
    }

    /// Reads the next character, or `None` at the end of the input.
    ///
    /// The end is reported once. Reading again without first calling [`unread`](Self::unread)
    /// or [`set_position`](Self::set_position) is an error.
    pub fn read(&mut self) -> Result<Option<char>> {
        if self.eof {
            return Err(Error::parse_at("Trying to read past EOF.", self.position));
        }
        match self.chars.get(self.position) {
            Some(c) => {
                self.position += 1;
                Ok(Some(*c))
            }
            None => {
                self.eof = true;
                Ok(None)
            }
        }
    }

    /// Pushes back the character last returned by [`read`](Self::read).
    pub fn unread(&mut self, c: Option<char>) {
        self.eof = false;
        if let Some(c) = c {
            if self.position > 0 && self.chars[self.position - 1] == c {
                self.position -= 1;
            }
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to `position`, which may be at most the length of the input.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.chars.len() {
            return Err(Error::illegal_argument(format!(
                "Position {position} is past the end of the input ({} characters).",
                self.chars.len()
            )));
        }
        self.position = position;
        self.eof = false;
        Ok(())
    }

    /// The characters in `start..end`.
    pub fn substring(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }
}
