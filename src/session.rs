//! Editor session state
//!
//! Everything the editor knows about the current window that is not the
//! document text itself: which file is open, the active settings, whether
//! quiet mode is on and what the status bar last said. A session is created
//! when the window opens and dropped when it closes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Settings, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::error::{EditorError, Result};

const APP_NAME: &str = "QuietText";

/// Messages shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    Saved,
    /// Quiet mode entered
    Quiet,
    /// Status bar cleared
    Hidden,
    NoFile,
    /// Bold and highlight only apply to plain `.txt` files
    NotPlainText,
    SettingsReloaded,
}

impl StatusMessage {
    pub fn text(&self) -> &'static str {
        match self {
            StatusMessage::Saved => "File saved",
            StatusMessage::Quiet => "Quiet mode (Esc to leave)",
            StatusMessage::Hidden => "",
            StatusMessage::NoFile => "No file open",
            StatusMessage::NotPlainText => "Bold and highlight work on .txt files only",
            StatusMessage::SettingsReloaded => "Settings reloaded",
        }
    }
}

/// State of one editor window
#[derive(Debug)]
pub struct EditorSession {
    filename: Option<PathBuf>,
    settings_path: PathBuf,
    settings: Settings,
    quiet_mode: bool,
    status: Option<StatusMessage>,
}

impl EditorSession {
    /// Open a session, reading settings from `settings_path`
    ///
    /// A missing or broken settings file falls back to defaults.
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        let settings_path = settings_path.into();
        let settings = Settings::load_or_default(&settings_path);
        Self::with_settings(settings_path, settings)
    }

    pub fn with_settings(settings_path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            filename: None,
            settings_path: settings_path.into(),
            settings,
            quiet_mode: false,
            status: None,
        }
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn status(&self) -> Option<StatusMessage> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet_mode
    }

    /// Title for the window: `"{file} - QuietText"` or `"Untitled - QuietText"`
    pub fn window_title(&self) -> String {
        match &self.filename {
            Some(path) => format!("{} - {}", path.display(), APP_NAME),
            None => format!("Untitled - {}", APP_NAME),
        }
    }

    /// Whether the open file is the settings document itself
    pub fn is_settings_file(&self) -> bool {
        self.filename.as_deref() == Some(self.settings_path.as_path())
    }

    /// Whether the open file is a plain `.txt` document
    pub fn is_plain_text(&self) -> bool {
        self.filename
            .as_deref()
            .and_then(|p| p.extension())
            .is_some_and(|ext| ext == "txt")
    }

    /// Forget the current file
    pub fn new_file(&mut self) {
        self.filename = None;
    }

    /// Read a file and make it the current one
    pub fn open(&mut self, path: &Path) -> Result<String> {
        let contents = fs::read_to_string(path)?;
        self.filename = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), bytes = contents.len(), "file opened");
        Ok(contents)
    }

    /// Open the settings document for editing, writing defaults if absent
    pub fn open_settings_file(&mut self) -> Result<String> {
        if !self.settings_path.exists() {
            self.settings.save(&self.settings_path)?;
        }
        let path = self.settings_path.clone();
        self.open(&path)
    }

    /// Write `text` to the current file
    ///
    /// Saving the settings document also reloads the settings.
    pub fn save(&mut self, text: &str) -> Result<()> {
        let path = self.filename.clone().ok_or(EditorError::NoFile)?;
        fs::write(&path, text)?;
        self.status = Some(StatusMessage::Saved);

        if self.is_settings_file() {
            self.reload_settings()?;
        }
        Ok(())
    }

    /// Write `text` to `path` and make it the current file
    pub fn save_as(&mut self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text)?;
        self.filename = Some(path.to_path_buf());
        self.status = Some(StatusMessage::Saved);
        Ok(())
    }

    /// Hide menu, status bar and scrollbars
    pub fn enter_quiet_mode(&mut self) {
        self.quiet_mode = true;
        self.status = Some(StatusMessage::Quiet);
    }

    pub fn leave_quiet_mode(&mut self) {
        self.quiet_mode = false;
        self.status = Some(StatusMessage::Hidden);
    }

    /// Grow or shrink the font and persist the new size
    pub fn change_font_size(&mut self, delta: i32) -> Result<u32> {
        let size = i64::from(self.settings.font_size) + i64::from(delta);
        self.settings.font_size = size.clamp(i64::from(MIN_FONT_SIZE), i64::from(MAX_FONT_SIZE)) as u32;

        // Only the font size changes on disk; other keys keep their stored values
        let mut stored = Settings::load_or_default(&self.settings_path);
        stored.font_size = self.settings.font_size;
        stored.save(&self.settings_path)?;
        Ok(self.settings.font_size)
    }

    /// Re-read the settings document
    pub fn reload_settings(&mut self) -> Result<()> {
        self.settings = Settings::load(&self.settings_path)?;
        self.status = Some(StatusMessage::SettingsReloaded);
        Ok(())
    }

    /// Replace the settings with the defaults document and store them
    pub fn reset_settings(&mut self, defaults_path: &Path) -> Result<()> {
        let defaults = Settings::load(defaults_path)?;
        defaults.save(&self.settings_path)?;
        self.settings = defaults;
        self.status = Some(StatusMessage::SettingsReloaded);
        Ok(())
    }
}
