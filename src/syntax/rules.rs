//! Token rules
//!
//! A rule pairs a compiled regular expression with the style its matches
//! receive. Rules are immutable once a grammar is loaded.

use regex::Regex;

use super::style::Style;
use crate::error::GrammarLoadError;

/// Index of a rule within its grammar (declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub usize);

impl RuleId {
    #[inline]
    pub fn idx(self) -> usize {
        self.0
    }
}

/// A single named pattern rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Rule name, also used as the annotation kind on the surface
    pub name: String,
    /// Compiled pattern
    pub pattern: Regex,
    /// Style applied to matches
    pub style: Style,
    /// The pattern may match across line breaks
    pub multiline: bool,
}

impl Rule {
    /// Compile a rule, failing if the pattern is not a valid regex
    pub fn new(name: &str, pattern: &str, style: Style) -> Result<Self, GrammarLoadError> {
        let pattern = Regex::new(pattern).map_err(|source| GrammarLoadError::InvalidPattern {
            rule: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            style,
            multiline: false,
        })
    }

    /// Builder: mark the rule as able to span lines
    pub fn spanning_lines(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Find the first non-empty match starting at or after `start`
    ///
    /// Matching runs against the whole text so that anchors and word
    /// boundaries see the real surrounding context.
    pub fn find_at(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        let mut pos = start;
        while pos <= text.len() {
            let m = self.pattern.find_at(text, pos)?;
            if m.start() < m.end() {
                return Some((m.start(), m.end()));
            }
            // Empty match: step over one character and retry
            pos = next_char_boundary(text, m.end());
        }
        None
    }
}

/// Smallest char boundary strictly after `pos` (or `len + 1` at the end)
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    let mut next = pos + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_find_at() {
        let rule = Rule::new("number", r"\d+", Style::default()).unwrap();
        assert_eq!(rule.find_at("abc 123 def", 0), Some((4, 7)));
        assert_eq!(rule.find_at("abc 123 def", 5), Some((5, 7)));
        assert_eq!(rule.find_at("no numbers", 0), None);
    }

    #[test]
    fn test_find_at_keeps_word_boundary_context() {
        let rule = Rule::new("kw", r"\bif\b", Style::default()).unwrap();
        // Starting inside "elif" must not produce a match for its tail
        assert_eq!(rule.find_at("elif x", 2), None);
        assert_eq!(rule.find_at("x if y", 1), Some((2, 4)));
    }

    #[test]
    fn test_find_at_skips_empty_matches() {
        let rule = Rule::new("maybe", r"a*", Style::default()).unwrap();
        assert_eq!(rule.find_at("bbaab", 0), Some((2, 4)));
        assert_eq!(rule.find_at("bbb", 0), None);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Rule::new("broken", r"(unclosed", Style::default()).unwrap_err();
        assert!(matches!(err, GrammarLoadError::InvalidPattern { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn test_next_char_boundary() {
        let text = "aé b";
        assert_eq!(next_char_boundary(text, 0), 1);
        assert_eq!(next_char_boundary(text, 1), 3);
        assert_eq!(next_char_boundary(text, 4), 5);
    }
}
