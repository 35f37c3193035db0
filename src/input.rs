//! Input handling - key translation
//!
//! Keys are packed into a `u32`: the low bits hold the character or special
//! key code, the high bits hold modifier flags. Control shortcuts keep their
//! case so that `C-s` (save) and `C-S` (save as) stay distinct.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Key modifier flags
pub mod key_flags {
    pub const CONTROL: u32 = 0x1000_0000;
    pub const SPEC: u32 = 0x8000_0000;
}

/// Special key codes (combined with `key_flags::SPEC`)
pub mod special {
    pub const ESCAPE: u32 = 0x01;
    pub const ENTER: u32 = 0x02;
    pub const TAB: u32 = 0x03;
    pub const BACKSPACE: u32 = 0x04;
    pub const DELETE: u32 = 0x05;
    pub const LEFT: u32 = 0x10;
    pub const RIGHT: u32 = 0x11;
    pub const UP: u32 = 0x12;
    pub const DOWN: u32 = 0x13;
    pub const HOME: u32 = 0x14;
    pub const END: u32 = 0x15;
}

/// Represents a key input with modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u32);

impl Key {
    /// Create a key from a character
    pub fn char(ch: char) -> Self {
        Key(ch as u32)
    }

    /// Create a control key (C-x); case is preserved
    pub fn ctrl(ch: char) -> Self {
        Key(key_flags::CONTROL | ch as u32)
    }

    /// Create a special key (arrows, escape, ...)
    pub fn special(code: u32) -> Self {
        Key(key_flags::SPEC | code)
    }

    pub fn escape() -> Self {
        Self::special(special::ESCAPE)
    }

    /// Get the raw key code
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Check if this is a control key
    pub fn is_ctrl(&self) -> bool {
        self.0 & key_flags::CONTROL != 0
    }

    /// Check if this is a special key
    pub fn is_special(&self) -> bool {
        self.0 & key_flags::SPEC != 0
    }

    /// Character inserted by this key, if it is a plain printable key
    pub fn insertable(&self) -> Option<char> {
        if self.0 & 0xF000_0000 != 0 {
            return match self.0 & !key_flags::SPEC {
                special::ENTER if self.is_special() => Some('\n'),
                special::TAB if self.is_special() => Some('\t'),
                _ => None,
            };
        }
        char::from_u32(self.0).filter(|ch| !ch.is_control())
    }

    /// Convert key to a human-readable string (e.g. "C-s", "Esc")
    pub fn display_name(&self) -> String {
        if self.is_special() {
            let name = match self.0 & !key_flags::SPEC {
                special::ESCAPE => "Esc",
                special::ENTER => "Enter",
                special::TAB => "Tab",
                special::BACKSPACE => "Backspace",
                special::DELETE => "Delete",
                special::LEFT => "Left",
                special::RIGHT => "Right",
                special::UP => "Up",
                special::DOWN => "Down",
                special::HOME => "Home",
                special::END => "End",
                code => return format!("special-0x{:02x}", code),
            };
            return name.to_string();
        }

        let base = self.0 & 0x00FF_FFFF;
        let ch = match char::from_u32(base) {
            Some(' ') => "SPC".to_string(),
            Some(ch) => ch.to_string(),
            None => format!("0x{:x}", base),
        };
        if self.is_ctrl() {
            format!("C-{}", ch)
        } else {
            ch
        }
    }
}

/// A key going down or coming back up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Press(Key),
    Release(Key),
}

/// Translate a crossterm key event
///
/// Repeats count as presses. Terminals that do not report releases simply
/// never produce `KeyInput::Release`.
pub fn translate_key(event: KeyEvent) -> Option<KeyInput> {
    let key = translate_code(event.code, event.modifiers)?;
    match event.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => Some(KeyInput::Press(key)),
        KeyEventKind::Release => Some(KeyInput::Release(key)),
    }
}

fn translate_code(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let shift = modifiers.contains(KeyModifiers::SHIFT);

    let key = match code {
        KeyCode::Char(ch) if ctrl => {
            let ch = if shift { ch.to_ascii_uppercase() } else { ch };
            Key::ctrl(ch)
        }
        KeyCode::Char(ch) => Key::char(ch),
        KeyCode::Esc => Key::escape(),
        KeyCode::Enter => Key::special(special::ENTER),
        KeyCode::Tab => Key::special(special::TAB),
        KeyCode::Backspace => Key::special(special::BACKSPACE),
        KeyCode::Delete => Key::special(special::DELETE),
        KeyCode::Left => Key::special(special::LEFT),
        KeyCode::Right => Key::special(special::RIGHT),
        KeyCode::Up => Key::special(special::UP),
        KeyCode::Down => Key::special(special::DOWN),
        KeyCode::Home => Key::special(special::HOME),
        KeyCode::End => Key::special(special::END),
        _ => return None,
    };
    Some(key)
}
