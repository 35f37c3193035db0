//! Style types for text annotations
//!
//! A [`Style`] is what a grammar rule paints onto the text surface: a
//! foreground/background color plus weight and slant. Grammar documents
//! describe styles loosely through [`StyleSpec`]; anything missing or
//! unreadable falls back to the default style instead of failing the load.

use serde::Deserialize;

/// Display colors
///
/// Named ANSI colors keep terminal output portable; `Rgb` carries the hex
/// colors grammar documents usually specify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    Rgb(u8, u8, u8),
}

impl Color {
    /// Parse a color from `#rrggbb`, `#rgb` or a color name
    ///
    /// Names are case-insensitive and accept `bright_red`, `bright-red`
    /// and `brightred` alike.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let name: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_lowercase();

        let color = match name.as_str() {
            "default" => Color::Default,
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "brightblack" | "gray" | "grey" => Color::BrightBlack,
            "brightred" => Color::BrightRed,
            "brightgreen" => Color::BrightGreen,
            "brightyellow" => Color::BrightYellow,
            "brightblue" => Color::BrightBlue,
            "brightmagenta" => Color::BrightMagenta,
            "brightcyan" => Color::BrightCyan,
            "brightwhite" => Color::BrightWhite,
            _ => return None,
        };
        Some(color)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            // #abc is shorthand for #aabbcc
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some(Color::Rgb(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold weight
    pub bold: bool,
    /// Italic slant
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Builder: set background color
    pub fn with_bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Check if this is the default (no styling)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Style as written in a grammar document
///
/// Every field is optional; see [`StyleSpec::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StyleSpec {
    pub foreground: Option<String>,
    pub background: Option<String>,
    /// `normal` or `bold`
    pub weight: Option<String>,
    /// `roman` or `italic`
    pub slant: Option<String>,
    pub underline: Option<bool>,
}

impl StyleSpec {
    /// Turn the loose description into a concrete [`Style`]
    ///
    /// `rule` only labels the log line emitted for a value that cannot be
    /// understood; such values fall back to their default.
    pub fn resolve(&self, rule: &str) -> Style {
        let color = |field: &str, value: &Option<String>| match value {
            None => Color::Default,
            Some(raw) => Color::parse(raw).unwrap_or_else(|| {
                tracing::warn!(rule, field, value = %raw, "unknown color, using default");
                Color::Default
            }),
        };

        let mut style = Style {
            fg: color("foreground", &self.foreground),
            bg: color("background", &self.background),
            underline: self.underline.unwrap_or(false),
            ..Style::default()
        };

        match self.weight.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("normal") => {}
            Some("bold") => style.bold = true,
            Some(other) => tracing::warn!(rule, weight = other, "unknown weight, using normal"),
        }

        match self.slant.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("roman") => {}
            Some("italic") => style.italic = true,
            Some(other) => tracing::warn!(rule, slant = other, "unknown slant, using roman"),
        }

        style
    }
}
