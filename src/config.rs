//! Editor settings
//!
//! Settings live in a TOML document, `config/settings.toml` by default.
//! Every key is optional; missing keys take their default and out-of-range
//! values are clamped.
//!
//! Example:
//! ```text
//! # Quiet Text settings
//! font_family = "Fira Code"
//! font_size = 16
//! tab_size = 4
//! text_wrap = "word"
//! highlight_mode = "incremental"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::syntax::{HighlightMode, MatchBudget};

/// Smallest font size the editor will use
pub const MIN_FONT_SIZE: u32 = 6;
/// Largest font size the editor will use
pub const MAX_FONT_SIZE: u32 = 400;

/// Insertion cursor off-time in milliseconds when blinking is enabled
const BLINK_OFF_MS: u32 = 300;

/// How long lines are wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextWrap {
    #[default]
    None,
    Char,
    Word,
}

/// Validated editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub font_family: String,
    pub font_size: u32,
    pub bg_color: String,
    pub font_color: String,
    /// Tab width in spaces
    pub tab_size: usize,
    pub top_spacing: u32,
    pub bottom_spacing: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    pub insertion_blink: bool,
    pub insertion_color: String,
    pub text_wrap: TextWrap,
    pub highlight_mode: HighlightMode,
    /// Documents smaller than this many bytes are always rescanned in full
    pub full_rescan_limit: usize,
    /// Time one highlighting rule may spend on a pass
    pub rule_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 14,
            bg_color: "#272822".to_string(),
            font_color: "#f8f8f2".to_string(),
            tab_size: 4,
            top_spacing: 0,
            bottom_spacing: 0,
            padding_x: 0,
            padding_y: 0,
            insertion_blink: true,
            insertion_color: "#f8f8f0".to_string(),
            text_wrap: TextWrap::None,
            highlight_mode: HighlightMode::Full,
            full_rescan_limit: 64 * 1024,
            rule_timeout_ms: 50,
        }
    }
}

impl Settings {
    /// Default settings document location
    pub fn default_path() -> PathBuf {
        PathBuf::from("config").join("settings.toml")
    }

    /// Parse settings from a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents)?;
        Ok(settings.validated())
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default settings");
                Self::default()
            }
        }
    }

    /// Write settings to a file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Clamp values into their usable ranges
    pub fn validated(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.tab_size = self.tab_size.clamp(1, 16);
        self.rule_timeout_ms = self.rule_timeout_ms.max(1);
        self
    }

    /// Insertion cursor off-time (0 disables blinking)
    pub fn insertion_off_time_ms(&self) -> u32 {
        if self.insertion_blink {
            BLINK_OFF_MS
        } else {
            0
        }
    }

    /// Matching budget derived from the settings
    pub fn match_budget(&self) -> MatchBudget {
        MatchBudget {
            per_rule: Duration::from_millis(self.rule_timeout_ms),
            ..MatchBudget::default()
        }
    }
}
