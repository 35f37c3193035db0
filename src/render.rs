//! Terminal rendering of an annotated document
//!
//! Prints the text with a line-number gutter, expanding tabs to the
//! configured tab stops and turning annotation styles into crossterm
//! color and attribute changes. Output goes to any `Write`, so it can be
//! captured in tests.

use std::io::Write;

use crossterm::queue;
use crossterm::style::{
    Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use unicode_width::UnicodeWidthChar;

use crate::document::{Annotation, TextSurface};
use crate::error::Result;
use crate::syntax::{AnnotationSink, Color, Style};

/// Convert a highlight color to a terminal color
pub fn term_color(color: Color) -> TermColor {
    match color {
        Color::Default => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
        Color::BrightBlack => TermColor::DarkGrey,
        Color::BrightRed => TermColor::Red,
        Color::BrightGreen => TermColor::Green,
        Color::BrightYellow => TermColor::Yellow,
        Color::BrightBlue => TermColor::Blue,
        Color::BrightMagenta => TermColor::Magenta,
        Color::BrightCyan => TermColor::Cyan,
        Color::BrightWhite => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
    }
}

/// Resolves styles for ascending byte offsets in one sweep
///
/// Holds the annotations sorted by start and the set covering the last
/// position asked about. Ties go to the most recently added annotation,
/// as with `TextSurface::style_at`.
struct StyleCursor<'a> {
    /// (insertion index, annotation) sorted by start
    pending: Vec<(usize, &'a Annotation)>,
    next: usize,
    active: Vec<(usize, &'a Annotation)>,
}

impl<'a> StyleCursor<'a> {
    fn new(surface: &'a TextSurface) -> Self {
        let mut pending: Vec<_> = surface.annotations().iter().enumerate().collect();
        pending.sort_by_key(|(_, a)| a.start);
        Self {
            pending,
            next: 0,
            active: Vec::new(),
        }
    }

    /// Style at `pos`; positions must not decrease between calls
    fn style_at(&mut self, pos: usize) -> Style {
        while let Some(&(idx, ann)) = self.pending.get(self.next) {
            if ann.start > pos {
                break;
            }
            self.active.push((idx, ann));
            self.next += 1;
        }
        self.active.retain(|(_, a)| a.end > pos);
        self.active
            .iter()
            .max_by_key(|(idx, _)| *idx)
            .map(|(_, a)| a.style)
            .unwrap_or_default()
    }
}

/// Document printer
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    tab_size: usize,
    /// Emit colors and attributes
    color: bool,
    line_numbers: bool,
}

impl Renderer {
    pub fn new(tab_size: usize) -> Self {
        Self {
            tab_size: tab_size.max(1),
            color: true,
            line_numbers: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    /// Print the whole surface
    ///
    /// A trailing newline does not produce an extra empty numbered line.
    pub fn render<W: Write>(&self, surface: &TextSurface, out: &mut W) -> Result<()> {
        let text = surface.text();
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = surface.line_count() - usize::from(body.len() < text.len());
        let width = lines.to_string().len();

        let mut styles = StyleCursor::new(surface);
        let mut offset = 0;
        for (idx, line) in body.split('\n').enumerate() {
            if self.line_numbers {
                self.gutter(out, idx + 1, width)?;
            }
            self.line(out, &mut styles, offset, line)?;
            queue!(out, Print('\n'))?;
            offset += line.len() + 1;
        }
        out.flush()?;
        Ok(())
    }

    fn gutter<W: Write>(&self, out: &mut W, lnum: usize, width: usize) -> Result<()> {
        let label = format!("{:>width$} ", lnum, width = width);
        if self.color {
            queue!(
                out,
                SetAttribute(Attribute::Dim),
                Print(label),
                SetAttribute(Attribute::NormalIntensity)
            )?;
        } else {
            queue!(out, Print(label))?;
        }
        Ok(())
    }

    /// Print one line; `offset` is the byte offset of its first character
    fn line<W: Write>(&self, out: &mut W, styles: &mut StyleCursor, offset: usize, line: &str) -> Result<()> {
        let mut col = 0;
        let mut current = Style::default();
        let mut run = String::new();

        for (i, ch) in line.char_indices() {
            let style = if self.color {
                styles.style_at(offset + i)
            } else {
                Style::default()
            };
            if style != current {
                self.styled_run(out, &run, current)?;
                run.clear();
                current = style;
            }

            if ch == '\t' {
                let n = self.tab_size - col % self.tab_size;
                run.extend(std::iter::repeat(' ').take(n));
                col += n;
            } else {
                run.push(ch);
                col += UnicodeWidthChar::width(ch).unwrap_or(0);
            }
        }
        self.styled_run(out, &run, current)
    }

    fn styled_run<W: Write>(&self, out: &mut W, run: &str, style: Style) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        if style.is_default() {
            queue!(out, Print(run))?;
            return Ok(());
        }

        if style.fg != Color::Default {
            queue!(out, SetForegroundColor(term_color(style.fg)))?;
        }
        if style.bg != Color::Default {
            queue!(out, SetBackgroundColor(term_color(style.bg)))?;
        }
        if style.bold {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if style.italic {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        if style.underline {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        queue!(out, Print(run), SetAttribute(Attribute::Reset), ResetColor)?;
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{GrammarRegistry, SyntaxHighlighter};

    fn plain(surface: &TextSurface, tab_size: usize) -> String {
        let mut out = Vec::new();
        Renderer::new(tab_size)
            .with_color(false)
            .render(surface, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_output_with_gutter() {
        let surface = TextSurface::from_text("def f():\n    pass\n");
        assert_eq!(plain(&surface, 4), "1 def f():\n2     pass\n");
    }

    #[test]
    fn test_gutter_width_grows() {
        let text: String = (1..=10).map(|n| format!("{}\n", n)).collect();
        let out = plain(&TextSurface::from_text(text), 4);
        assert!(out.starts_with(" 1 1\n"));
        assert!(out.ends_with("10 10\n"));
    }

    #[test]
    fn test_tab_expansion_uses_display_width() {
        assert_eq!(plain(&TextSurface::from_text("a\tb"), 4), "1 a   b\n");
        assert_eq!(plain(&TextSurface::from_text("中\tx"), 4), "1 中  x\n");
        assert_eq!(plain(&TextSurface::from_text("\tx"), 2), "1   x\n");
    }

    #[test]
    fn test_without_line_numbers() {
        let mut out = Vec::new();
        Renderer::new(4)
            .with_color(false)
            .with_line_numbers(false)
            .render(&TextSurface::from_text("x\ny"), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x\ny\n");
    }

    #[test]
    fn test_colored_output_marks_keywords() {
        let registry = GrammarRegistry::with_builtins();
        let grammar = registry.get("python").expect("builtin python grammar");
        let mut surface = TextSurface::from_text("pass");
        SyntaxHighlighter::new(grammar).highlight_all(&mut surface);
        let keyword = surface.style_at(0);

        let mut out = Vec::new();
        Renderer::new(4)
            .with_line_numbers(false)
            .render(&surface, &mut out)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("pass"));
        assert!(out.contains('\x1b'));
        assert_ne!(out, "pass\n");
        assert!(!keyword.is_default());
    }

    #[test]
    fn test_style_cursor_agrees_with_surface() {
        let text = "def f():\n    pass  # done\n\tx = 'a'";
        let mut surface = TextSurface::from_text(text);
        let registry = GrammarRegistry::with_builtins();
        let grammar = registry.get("python").expect("builtin python grammar");
        SyntaxHighlighter::new(grammar).highlight_all(&mut surface);
        surface.annotate("bold", 2..14, Style::default().with_bold()).unwrap();
        surface.annotate("find_match", 13..17, Style::default().with_bg(Color::Blue)).unwrap();

        let mut cursor = StyleCursor::new(&surface);
        for pos in 0..=text.len() {
            assert_eq!(cursor.style_at(pos), surface.style_at(pos), "at {}", pos);
        }
    }

    #[test]
    fn test_empty_and_newline_only() {
        assert_eq!(plain(&TextSurface::new(), 4), "1 \n");
        assert_eq!(plain(&TextSurface::from_text("\n"), 4), "1 \n");
    }

    #[test]
    fn test_term_color() {
        assert_eq!(term_color(Color::Rgb(1, 2, 3)), TermColor::Rgb { r: 1, g: 2, b: 3 });
        assert_eq!(term_color(Color::BrightRed), TermColor::Red);
        assert_eq!(term_color(Color::Default), TermColor::Reset);
    }
}
