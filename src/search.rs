//! Find support
//!
//! Case-insensitive literal search with wrap-around. The current match is
//! marked on the surface with the `find_match` annotation.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::error::SinkError;
use crate::syntax::{AnnotationSink, Color, Style};

/// Annotation kind used for the current find match
pub const FIND_MATCH: &str = "find_match";

/// Style of the current find match
pub fn find_match_style() -> Style {
    Style::default().with_bg(Color::Rgb(0x75, 0x71, 0x5e))
}

fn literal(needle: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Find the next occurrence of `needle` at or after `from`, wrapping around
pub fn find_next(text: &str, needle: &str, from: usize) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let re = literal(needle)?;
    let from = from.min(text.len());
    let from = if text.is_char_boundary(from) { from } else { 0 };

    re.find_at(text, from)
        .or_else(|| re.find(text))
        .map(|m| m.range())
}

/// Search state kept between "find next" requests
#[derive(Debug, Clone, Default)]
pub struct FindState {
    needle: String,
    /// Where the next search starts
    next_from: usize,
}

impl FindState {
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Move to the next match and mark it on `sink`
    ///
    /// A new needle restarts the search from the top of the document.
    pub fn find<S>(&mut self, needle: &str, sink: &mut S) -> Result<Option<Range<usize>>, SinkError>
    where
        S: AnnotationSink + ?Sized,
    {
        if needle != self.needle {
            self.needle = needle.to_string();
            self.next_from = 0;
        }

        let len = sink.len();
        sink.clear_annotations(FIND_MATCH, 0..len)?;

        let found = find_next(sink.text(), needle, self.next_from);
        if let Some(range) = &found {
            sink.annotate(FIND_MATCH, range.clone(), find_match_style())?;
            self.next_from = range.end;
        }
        Ok(found)
    }
}
