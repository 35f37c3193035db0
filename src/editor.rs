//! Editor state
//!
//! Ties the document, the session and the highlighting engine together.
//! Every operation runs synchronously on the caller's thread; highlighting
//! problems are logged and never stop editing or saving.

use std::ops::Range;
use std::path::Path;

use crate::dispatch::{CommandStatus, DispatchTable, EditEvent, KeyBindings};
use crate::document::TextSurface;
use crate::error::{Result, SinkError};
use crate::input::{special, Key, KeyInput};
use crate::search::FindState;
use crate::session::{EditorSession, StatusMessage};
use crate::syntax::{
    clamp_region, AnnotationSink, Color, GrammarRegistry, HighlightTrigger, Matcher, PassOutcome,
    Style, SyntaxHighlighter,
};

/// Annotation kind for user bold text
pub const BOLD: &str = "bold";
/// Annotation kind for user highlighted text
pub const HIGHLIGHT: &str = "highlight";

/// Main editor state
pub struct Editor {
    /// Filename, settings, quiet mode and status
    pub session: EditorSession,
    /// Document text and annotations
    pub document: TextSurface,
    registry: GrammarRegistry,
    /// Highlighter for the current document's language, if any
    highlighter: Option<SyntaxHighlighter>,
    trigger: HighlightTrigger,
    find: FindState,
    dispatch: DispatchTable,
    keys: KeyBindings,
    /// Insertion cursor (byte offset)
    cursor: usize,
    selection: Option<Range<usize>>,
}

impl Editor {
    pub fn new(session: EditorSession, registry: GrammarRegistry) -> Self {
        let mut editor = Self {
            session,
            document: TextSurface::new(),
            registry,
            highlighter: None,
            trigger: HighlightTrigger::default(),
            find: FindState::default(),
            dispatch: DispatchTable::with_defaults(),
            keys: KeyBindings::with_defaults(),
            cursor: 0,
            selection: None,
        };
        editor.apply_settings();
        editor
    }

    /// Run the handler bound to `event`
    pub fn dispatch(&mut self, event: EditEvent) -> Result<CommandStatus> {
        match self.dispatch.lookup(event.kind()) {
            Some(handler) => handler(self, &event),
            None => Ok(CommandStatus::Unhandled),
        }
    }

    /// Translate a key press or release into an event and dispatch it
    pub fn handle_key(&mut self, input: KeyInput) -> Result<CommandStatus> {
        let key = match input {
            KeyInput::Release(_) => return self.dispatch(EditEvent::KeyRelease),
            KeyInput::Press(key) => key,
        };

        if let Some(event) = self.keys.lookup(key).cloned() {
            return self.dispatch(event);
        }
        if let Some(ch) = key.insertable() {
            let mut buf = [0u8; 4];
            let text = ch.encode_utf8(&mut buf).to_string();
            return self.dispatch(EditEvent::Insert {
                pos: self.cursor,
                text,
            });
        }
        self.move_or_erase(key)
    }

    fn move_or_erase(&mut self, key: Key) -> Result<CommandStatus> {
        if !key.is_special() {
            return Ok(CommandStatus::Unhandled);
        }
        let text = self.document.text();
        let prev = text[..self.cursor].chars().next_back().map(|c| self.cursor - c.len_utf8());
        let next = text[self.cursor..].chars().next().map(|c| self.cursor + c.len_utf8());

        match (key.code() & 0xFF, prev, next) {
            (special::BACKSPACE, Some(p), _) => self.dispatch(EditEvent::Delete(p..self.cursor)),
            (special::DELETE, _, Some(n)) => self.dispatch(EditEvent::Delete(self.cursor..n)),
            (special::LEFT, Some(p), _) => {
                self.cursor = p;
                Ok(CommandStatus::Success)
            }
            (special::RIGHT, _, Some(n)) => {
                self.cursor = n;
                Ok(CommandStatus::Success)
            }
            (special::HOME, _, _) => {
                self.cursor = text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
                Ok(CommandStatus::Success)
            }
            (special::END, _, _) => {
                self.cursor = text[self.cursor..].find('\n').map_or(text.len(), |i| self.cursor + i);
                Ok(CommandStatus::Success)
            }
            _ => Ok(CommandStatus::Failure),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// Select a range, snapped to the text's char boundaries
    pub fn set_selection(&mut self, range: Range<usize>) {
        let range = clamp_region(self.document.text(), range);
        self.cursor = range.end;
        self.selection = Some(range);
    }

    /// Language of the active highlighter
    pub fn language(&self) -> Option<&str> {
        self.highlighter.as_ref().map(|h| h.language())
    }

    pub fn trigger(&self) -> &HighlightTrigger {
        &self.trigger
    }

    /// Push the session's settings into the highlighting engine
    pub fn apply_settings(&mut self) {
        let settings = self.session.settings();
        self.trigger.set_mode(settings.highlight_mode);
        self.trigger.set_full_rescan_limit(settings.full_rescan_limit);
        let budget = settings.match_budget();
        if let Some(highlighter) = self.highlighter.take() {
            self.highlighter = Some(highlighter.with_matcher(Matcher::with_budget(budget)));
        }
    }

    /// Pick the highlighter for the current file name
    fn select_highlighter(&mut self) {
        let grammar = self.session.filename().and_then(|path| self.registry.detect(path));
        let budget = self.session.settings().match_budget();
        self.highlighter =
            grammar.map(|g| SyntaxHighlighter::new(g).with_matcher(Matcher::with_budget(budget)));
        self.trigger.reset();
        tracing::debug!(language = ?self.language(), "highlighter selected");
    }

    /// Force a language regardless of the file name and rehighlight
    ///
    /// Returns `false` if no grammar is registered under `language`.
    pub fn set_language(&mut self, language: &str) -> bool {
        let Some(grammar) = self.registry.get(language) else {
            return false;
        };
        let budget = self.session.settings().match_budget();
        self.highlighter = Some(SyntaxHighlighter::new(grammar).with_matcher(Matcher::with_budget(budget)));
        self.trigger.reset();
        self.highlight(None);
        true
    }

    /// Insert text, remembering the edit for the next highlight pass
    pub fn insert(&mut self, pos: usize, text: &str) -> std::result::Result<(), SinkError> {
        let edit = self.document.insert(pos, text)?;
        self.trigger.record(edit);
        if self.cursor >= pos {
            self.cursor += text.len();
        }
        self.selection = None;
        Ok(())
    }

    /// Delete a range, remembering the edit for the next highlight pass
    pub fn delete(&mut self, range: Range<usize>) -> std::result::Result<String, SinkError> {
        let (removed, edit) = self.document.delete(range.clone())?;
        self.trigger.record(edit);
        if self.cursor > range.end {
            self.cursor -= range.len();
        } else if self.cursor > range.start {
            self.cursor = range.start;
        }
        self.selection = None;
        Ok(removed)
    }

    /// Key released: run a triggered pass if the document has a language
    pub fn on_key_release(&mut self) -> Option<PassOutcome> {
        let highlighter = self.highlighter.as_ref()?;
        self.trigger.on_edit(None, highlighter, &mut self.document)
    }

    /// Highlight a region (whole document when `None`)
    pub fn highlight(&mut self, region: Option<Range<usize>>) -> Option<PassOutcome> {
        let highlighter = self.highlighter.as_ref()?;
        let region = region.unwrap_or(0..self.document.len());
        self.trigger.request(region, highlighter, &mut self.document)
    }

    /// Start an empty, untitled document
    pub fn new_file(&mut self) {
        self.document.set_text("");
        self.session.new_file();
        self.highlighter = None;
        self.trigger.reset();
        self.cursor = 0;
        self.selection = None;
    }

    /// Load a file into the document and highlight it
    pub fn open_file(&mut self, path: &Path) -> Result<()> {
        let text = self.session.open(path)?;
        self.load_text(text);
        Ok(())
    }

    /// Open the settings document for editing
    pub fn open_settings(&mut self) -> Result<()> {
        let text = self.session.open_settings_file()?;
        self.load_text(text);
        Ok(())
    }

    fn load_text(&mut self, text: String) {
        self.document.set_text(text);
        self.cursor = 0;
        self.selection = None;
        self.select_highlighter();
        self.highlight(None);
    }

    /// Save the document to the current file
    pub fn save(&mut self) -> Result<()> {
        self.session.save(self.document.text())?;
        self.document.set_modified(false);
        if self.session.is_settings_file() {
            self.apply_settings();
        }
        Ok(())
    }

    /// Save the document under a new name
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.session.save_as(path, self.document.text())?;
        self.document.set_modified(false);
        self.select_highlighter();
        self.highlight(None);
        Ok(())
    }

    /// Find the next occurrence of `needle` and mark it
    pub fn find(&mut self, needle: &str) -> Option<Range<usize>> {
        match self.find.find(needle, &mut self.document) {
            Ok(found) => {
                if let Some(range) = &found {
                    self.cursor = range.start;
                }
                found
            }
            Err(e) => {
                tracing::debug!(error = %e, "find failed");
                None
            }
        }
    }

    pub fn select_all(&mut self) {
        self.selection = Some(0..self.document.len());
        self.cursor = 0;
    }

    /// Toggle bold over the selection
    pub fn toggle_bold(&mut self) -> CommandStatus {
        self.toggle_annotation(BOLD, Style::default().with_bold())
    }

    /// Toggle a background highlight over the selection
    pub fn toggle_highlight(&mut self, color: Color) -> CommandStatus {
        self.toggle_annotation(HIGHLIGHT, Style::fg(Color::Black).with_bg(color))
    }

    /// Remove `kind` from the selection if its start already carries it,
    /// otherwise add it. Only plain `.txt` files take user formatting.
    fn toggle_annotation(&mut self, kind: &str, style: Style) -> CommandStatus {
        if self.session.filename().is_none() {
            self.session.set_status(StatusMessage::NoFile);
            return CommandStatus::Failure;
        }
        if !self.session.is_plain_text() {
            self.session.set_status(StatusMessage::NotPlainText);
            return CommandStatus::Failure;
        }
        let Some(selection) = self.selection.clone().filter(|s| !s.is_empty()) else {
            return CommandStatus::Failure;
        };

        let present = self
            .document
            .annotations_at(selection.start)
            .iter()
            .any(|a| a.kind == kind);
        let result = if present {
            self.document.clear_annotations(kind, selection)
        } else {
            self.document.annotate(kind, selection, style)
        };
        match result {
            Ok(()) => CommandStatus::Success,
            Err(e) => {
                tracing::debug!(error = %e, kind, "formatting rejected");
                CommandStatus::Failure
            }
        }
    }
}
