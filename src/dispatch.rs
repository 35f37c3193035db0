//! Event dispatch
//!
//! The UI layer turns toolkit callbacks into [`EditEvent`]s and hands them to
//! [`Editor::dispatch`](crate::editor::Editor::dispatch), which looks the
//! handler up in a [`DispatchTable`] and runs it synchronously. Keyboard
//! shortcuts go through [`KeyBindings`] first.

use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;

use crate::editor::Editor;
use crate::error::Result;
use crate::input::Key;
use crate::syntax::Color;

/// Background used by the Ctrl-h highlight shortcut
pub const DEFAULT_HIGHLIGHT: Color = Color::Rgb(0xe6, 0xdb, 0x74);

/// Handler result status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
    /// No handler is bound to the event
    Unhandled,
}

/// Something that happened in the editor window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// A key was released; this is what drives highlighting
    KeyRelease,
    Insert { pos: usize, text: String },
    Delete(Range<usize>),
    /// Explicit highlight request; `None` means the whole document
    HighlightRequest(Option<Range<usize>>),
    NewFile,
    OpenFile(PathBuf),
    OpenSettings,
    Save,
    SaveAs(PathBuf),
    EnterQuietMode,
    LeaveQuietMode,
    FontSize(i32),
    Find(String),
    SelectAll,
    /// Toggle bold over the selection (`.txt` files only)
    ToggleBold,
    /// Toggle a background highlight over the selection (`.txt` files only)
    ToggleHighlight(Color),
}

/// Payload-free discriminant of [`EditEvent`], used as the table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyRelease,
    Insert,
    Delete,
    HighlightRequest,
    NewFile,
    OpenFile,
    OpenSettings,
    Save,
    SaveAs,
    EnterQuietMode,
    LeaveQuietMode,
    FontSize,
    Find,
    SelectAll,
    ToggleBold,
    ToggleHighlight,
}

impl EditEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditEvent::KeyRelease => EventKind::KeyRelease,
            EditEvent::Insert { .. } => EventKind::Insert,
            EditEvent::Delete(_) => EventKind::Delete,
            EditEvent::HighlightRequest(_) => EventKind::HighlightRequest,
            EditEvent::NewFile => EventKind::NewFile,
            EditEvent::OpenFile(_) => EventKind::OpenFile,
            EditEvent::OpenSettings => EventKind::OpenSettings,
            EditEvent::Save => EventKind::Save,
            EditEvent::SaveAs(_) => EventKind::SaveAs,
            EditEvent::EnterQuietMode => EventKind::EnterQuietMode,
            EditEvent::LeaveQuietMode => EventKind::LeaveQuietMode,
            EditEvent::FontSize(_) => EventKind::FontSize,
            EditEvent::Find(_) => EventKind::Find,
            EditEvent::SelectAll => EventKind::SelectAll,
            EditEvent::ToggleBold => EventKind::ToggleBold,
            EditEvent::ToggleHighlight(_) => EventKind::ToggleHighlight,
        }
    }
}

/// Handler function signature
pub type HandlerFn = fn(&mut Editor, &EditEvent) -> Result<CommandStatus>;

/// Handler entry with a name for listings
struct HandlerEntry {
    function: HandlerFn,
    name: &'static str,
}

/// Event kind to handler table
pub struct DispatchTable {
    handlers: HashMap<EventKind, HandlerEntry>,
}

impl DispatchTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a table with the default handlers
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.bind(EventKind::KeyRelease, key_release, "syntax-highlight");
        table.bind(EventKind::Insert, insert, "insert");
        table.bind(EventKind::Delete, delete, "delete");
        table.bind(EventKind::HighlightRequest, highlight_request, "highlight-region");
        table.bind(EventKind::NewFile, new_file, "new-file");
        table.bind(EventKind::OpenFile, open_file, "open-file");
        table.bind(EventKind::OpenSettings, open_settings, "open-settings");
        table.bind(EventKind::Save, save, "save");
        table.bind(EventKind::SaveAs, save_as, "save-as");
        table.bind(EventKind::EnterQuietMode, enter_quiet_mode, "enter-quiet-mode");
        table.bind(EventKind::LeaveQuietMode, leave_quiet_mode, "leave-quiet-mode");
        table.bind(EventKind::FontSize, font_size, "change-font-size");
        table.bind(EventKind::Find, find, "find");
        table.bind(EventKind::SelectAll, select_all, "select-all");
        table.bind(EventKind::ToggleBold, toggle_bold, "toggle-bold");
        table.bind(EventKind::ToggleHighlight, toggle_highlight, "toggle-highlight");
        table
    }

    /// Bind a handler, replacing any previous one
    pub fn bind(&mut self, kind: EventKind, function: HandlerFn, name: &'static str) {
        self.handlers.insert(kind, HandlerEntry { function, name });
    }

    pub fn unbind(&mut self, kind: EventKind) {
        self.handlers.remove(&kind);
    }

    /// Look up the handler for an event kind
    pub fn lookup(&self, kind: EventKind) -> Option<HandlerFn> {
        self.handlers.get(&kind).map(|e| e.function)
    }

    pub fn lookup_name(&self, kind: EventKind) -> Option<&'static str> {
        self.handlers.get(&kind).map(|e| e.name)
    }

    /// Get all unique handler names (sorted)
    pub fn handler_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.values().map(|e| e.name).collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Keyboard shortcuts
pub struct KeyBindings {
    bindings: HashMap<Key, EditEvent>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Default shortcuts; open/save-as/find need a dialog and are left to the UI
    pub fn with_defaults() -> Self {
        let mut keys = Self::new();
        keys.bind(Key::ctrl('n'), EditEvent::NewFile);
        keys.bind(Key::ctrl('s'), EditEvent::Save);
        keys.bind(Key::ctrl('a'), EditEvent::SelectAll);
        keys.bind(Key::ctrl('q'), EditEvent::EnterQuietMode);
        keys.bind(Key::escape(), EditEvent::LeaveQuietMode);
        keys.bind(Key::ctrl('='), EditEvent::FontSize(1));
        keys.bind(Key::ctrl('-'), EditEvent::FontSize(-1));
        keys.bind(Key::ctrl('b'), EditEvent::ToggleBold);
        keys.bind(Key::ctrl('h'), EditEvent::ToggleHighlight(DEFAULT_HIGHLIGHT));
        keys
    }

    pub fn bind(&mut self, key: Key, event: EditEvent) {
        self.bindings.insert(key, event);
    }

    pub fn lookup(&self, key: Key) -> Option<&EditEvent> {
        self.bindings.get(&key)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn key_release(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.on_key_release();
    Ok(CommandStatus::Success)
}

fn insert(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::Insert { pos, text } = event else {
        return Ok(CommandStatus::Failure);
    };
    Ok(status(editor.insert(*pos, text)))
}

fn delete(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::Delete(range) = event else {
        return Ok(CommandStatus::Failure);
    };
    Ok(status(editor.delete(range.clone())))
}

fn highlight_request(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::HighlightRequest(region) = event else {
        return Ok(CommandStatus::Failure);
    };
    match editor.highlight(region.clone()) {
        Some(_) => Ok(CommandStatus::Success),
        None => Ok(CommandStatus::Failure),
    }
}

fn new_file(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.new_file();
    Ok(CommandStatus::Success)
}

fn open_file(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::OpenFile(path) = event else {
        return Ok(CommandStatus::Failure);
    };
    editor.open_file(path)?;
    Ok(CommandStatus::Success)
}

fn open_settings(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.open_settings()?;
    Ok(CommandStatus::Success)
}

fn save(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.save()?;
    Ok(CommandStatus::Success)
}

fn save_as(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::SaveAs(path) = event else {
        return Ok(CommandStatus::Failure);
    };
    editor.save_as(path)?;
    Ok(CommandStatus::Success)
}

fn enter_quiet_mode(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.session.enter_quiet_mode();
    Ok(CommandStatus::Success)
}

fn leave_quiet_mode(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.session.leave_quiet_mode();
    Ok(CommandStatus::Success)
}

fn font_size(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::FontSize(delta) = event else {
        return Ok(CommandStatus::Failure);
    };
    editor.session.change_font_size(*delta)?;
    Ok(CommandStatus::Success)
}

fn find(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::Find(needle) = event else {
        return Ok(CommandStatus::Failure);
    };
    match editor.find(needle) {
        Some(_) => Ok(CommandStatus::Success),
        None => Ok(CommandStatus::Failure),
    }
}

fn select_all(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    editor.select_all();
    Ok(CommandStatus::Success)
}

fn toggle_bold(editor: &mut Editor, _event: &EditEvent) -> Result<CommandStatus> {
    Ok(editor.toggle_bold())
}

fn toggle_highlight(editor: &mut Editor, event: &EditEvent) -> Result<CommandStatus> {
    let EditEvent::ToggleHighlight(color) = event else {
        return Ok(CommandStatus::Failure);
    };
    Ok(editor.toggle_highlight(*color))
}

fn status<T, E>(result: std::result::Result<T, E>) -> CommandStatus {
    match result {
        Ok(_) => CommandStatus::Success,
        Err(_) => CommandStatus::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_every_kind() {
        let table = DispatchTable::with_defaults();
        let kinds = [
            EditEvent::KeyRelease,
            EditEvent::Insert { pos: 0, text: String::new() },
            EditEvent::Delete(0..0),
            EditEvent::HighlightRequest(None),
            EditEvent::NewFile,
            EditEvent::OpenFile(PathBuf::new()),
            EditEvent::OpenSettings,
            EditEvent::Save,
            EditEvent::SaveAs(PathBuf::new()),
            EditEvent::EnterQuietMode,
            EditEvent::LeaveQuietMode,
            EditEvent::FontSize(1),
            EditEvent::Find(String::new()),
            EditEvent::SelectAll,
            EditEvent::ToggleBold,
            EditEvent::ToggleHighlight(Color::Yellow),
        ];
        for event in kinds {
            assert!(table.lookup(event.kind()).is_some(), "{:?} unbound", event);
        }
        assert_eq!(table.lookup_name(EventKind::KeyRelease), Some("syntax-highlight"));
    }

    #[test]
    fn test_unbind() {
        let mut table = DispatchTable::with_defaults();
        table.unbind(EventKind::Save);
        assert!(table.lookup(EventKind::Save).is_none());
        assert!(!table.handler_names().contains(&"save"));
    }

    #[test]
    fn test_default_key_bindings() {
        let keys = KeyBindings::with_defaults();
        assert_eq!(keys.lookup(Key::ctrl('s')), Some(&EditEvent::Save));
        assert_eq!(keys.lookup(Key::escape()), Some(&EditEvent::LeaveQuietMode));
        assert_eq!(keys.lookup(Key::ctrl('S')), None);
        assert_eq!(keys.lookup(Key::char('s')), None);
        assert_eq!(keys.lookup(Key::ctrl('b')), Some(&EditEvent::ToggleBold));
        assert_eq!(
            keys.lookup(Key::ctrl('h')),
            Some(&EditEvent::ToggleHighlight(DEFAULT_HIGHLIGHT))
        );
    }
}
