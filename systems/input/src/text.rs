//! Keyboard focus and single-line text entry.

use serde::{Deserialize, Serialize};
use tactica_core::keys;

/// Consumer that currently owns keyboard input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputFocus {
    /// Keys drive game actions.
    #[default]
    Game,
    /// A menu owns the keyboard.
    Menu,
    /// A text field owns the keyboard.
    Text,
    /// Input is ignored entirely.
    Disabled,
}

/// Outcome of a finished text entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEntryStatus {
    /// The field is still accepting keys.
    Editing,
    /// Enter was pressed.
    Confirmed,
    /// Escape was pressed or focus moved away.
    Cancelled,
}

/// Single-line ASCII text buffer with a cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
    max_len: usize,
    status: TextEntryStatus,
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TextInput {
    /// Creates an empty buffer accepting at most `max_len` characters.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: String::with_capacity(max_len),
            cursor: 0,
            max_len,
            status: TextEntryStatus::Editing,
        }
    }

    /// Current contents.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor position measured in characters.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// State of the entry.
    #[must_use]
    pub const fn status(&self) -> TextEntryStatus {
        self.status
    }

    /// Inserts a printable ASCII character at the cursor. Returns `false` when full.
    pub fn insert(&mut self, character: char) -> bool {
        if self.status != TextEntryStatus::Editing
            || !character.is_ascii()
            || character.is_ascii_control()
            || self.buffer.len() >= self.max_len
        {
            return false;
        }
        self.buffer.insert(self.cursor, character);
        self.cursor += 1;
        true
    }

    /// Removes the character before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let _ = self.buffer.remove(self.cursor);
        true
    }

    /// Removes the character under the cursor.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let _ = self.buffer.remove(self.cursor);
        true
    }

    /// Moves the cursor one character left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor one character right.
    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.len());
    }

    /// Moves the cursor to the start.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor past the last character.
    pub fn end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Finishes the entry, keeping the text.
    pub fn confirm(&mut self) {
        self.status = TextEntryStatus::Confirmed;
    }

    /// Abandons the entry.
    pub fn cancel(&mut self) {
        self.status = TextEntryStatus::Cancelled;
    }

    /// Applies a typed key. Returns `true` when the key was consumed.
    pub fn handle_key(&mut self, key: u8, shift: bool) -> bool {
        if self.status != TextEntryStatus::Editing {
            return false;
        }
        match key {
            keys::RETURN => {
                self.confirm();
                true
            }
            keys::ESCAPE => {
                self.cancel();
                true
            }
            keys::BACKSPACE => self.backspace(),
            keys::DELETE => self.delete(),
            keys::LEFT => {
                self.move_left();
                true
            }
            keys::RIGHT => {
                self.move_right();
                true
            }
            keys::HOME => {
                self.home();
                true
            }
            keys::END => {
                self.end();
                true
            }
            _ => key_to_char(key, shift).is_some_and(|character| self.insert(character)),
        }
    }
}

/// Printable character produced by a key code on a US layout.
#[must_use]
pub fn key_to_char(key: u8, shift: bool) -> Option<char> {
    const SHIFTED_DIGITS: &[u8; 10] = b")!@#$%^&*(";
    let pick = |plain: char, shifted: char| Some(if shift { shifted } else { plain });
    match key {
        b'A'..=b'Z' => {
            let upper = char::from(key);
            Some(if shift { upper } else { upper.to_ascii_lowercase() })
        }
        b'0'..=b'9' => {
            if shift {
                Some(char::from(SHIFTED_DIGITS[usize::from(key - b'0')]))
            } else {
                Some(char::from(key))
            }
        }
        keys::SPACE => Some(' '),
        b'-' => pick('-', '_'),
        b'=' => pick('=', '+'),
        b'[' => pick('[', '{'),
        b']' => pick(']', '}'),
        b';' => pick(';', ':'),
        b'\'' => pick('\'', '"'),
        b',' => pick(',', '<'),
        b'.' => pick('.', '>'),
        b'/' => pick('/', '?'),
        b'\\' => pick('\\', '|'),
        b'`' => pick('`', '~'),
        _ => None,
    }
}
