//! Document text and its annotations
//!
//! `TextSurface` plays the role of the toolkit text widget: it owns the text,
//! keeps a list of named, styled annotations over byte ranges, and shifts or
//! trims those annotations as text is inserted and deleted.

use std::ops::Range;

use crate::error::SinkError;
use crate::syntax::{AnnotationSink, Edit, Style};

/// A named style over `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

impl Annotation {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Editable text with annotations
#[derive(Debug, Default)]
pub struct TextSurface {
    text: String,
    annotations: Vec<Annotation>,
    /// Whether text changed since the last load/save
    modified: bool,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface holding `text`, with no annotations
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Vec::new(),
            modified: false,
        }
    }

    /// Replace the whole text, dropping every annotation
    pub fn set_text(&mut self, text: impl Into<String>) -> Edit {
        let removed = self.text.len();
        self.text = text.into();
        self.annotations.clear();
        self.modified = false;
        Edit::new(0, removed, self.text.len())
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Insert `s` at byte offset `pos`
    ///
    /// Annotations after `pos` move right; an annotation strictly
    /// surrounding `pos` grows to cover the inserted text.
    pub fn insert(&mut self, pos: usize, s: &str) -> Result<Edit, SinkError> {
        self.check_offset(pos)?;
        self.text.insert_str(pos, s);
        let n = s.len();

        for ann in &mut self.annotations {
            if ann.start >= pos {
                ann.start += n;
                ann.end += n;
            } else if ann.end > pos {
                ann.end += n;
            }
        }
        self.modified = true;
        Ok(Edit::new(pos, 0, n))
    }

    /// Delete the bytes in `range`, returning the removed text
    pub fn delete(&mut self, range: Range<usize>) -> Result<(String, Edit), SinkError> {
        self.check_region(&range)?;
        let removed: String = self.text.drain(range.clone()).collect();
        let (a, b) = (range.start, range.end);
        let shift = |x: usize| {
            if x <= a {
                x
            } else if x <= b {
                a
            } else {
                x - (b - a)
            }
        };

        for ann in &mut self.annotations {
            ann.start = shift(ann.start);
            ann.end = shift(ann.end);
        }
        self.annotations.retain(|ann| ann.start < ann.end);
        self.modified = true;
        Ok((removed, Edit::new(a, b - a, 0)))
    }

    /// All annotations, in the order they were added
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations of one kind sorted by start offset
    pub fn annotations_of(&self, kind: &str) -> Vec<&Annotation> {
        let mut found: Vec<_> = self.annotations.iter().filter(|a| a.kind == kind).collect();
        found.sort_by_key(|a| (a.start, a.end));
        found
    }

    /// Annotations covering byte `pos`
    pub fn annotations_at(&self, pos: usize) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.start <= pos && pos < a.end)
            .collect()
    }

    /// Style at `pos`; the most recently added annotation wins
    pub fn style_at(&self, pos: usize) -> Style {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.start <= pos && pos < a.end)
            .map(|a| a.style)
            .unwrap_or_default()
    }

    /// Number of lines (an empty document has one line)
    pub fn line_count(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    fn check_offset(&self, pos: usize) -> Result<(), SinkError> {
        if pos > self.text.len() {
            return Err(SinkError::OutOfBounds {
                start: pos,
                end: pos,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(pos) {
            return Err(SinkError::NotCharBoundary { offset: pos });
        }
        Ok(())
    }

    fn check_region(&self, region: &Range<usize>) -> Result<(), SinkError> {
        if region.start > region.end || region.end > self.text.len() {
            return Err(SinkError::OutOfBounds {
                start: region.start,
                end: region.end,
                len: self.text.len(),
            });
        }
        self.check_offset(region.start)?;
        self.check_offset(region.end)
    }
}

impl AnnotationSink for TextSurface {
    fn text(&self) -> &str {
        &self.text
    }

    fn clear_annotations(&mut self, kind: &str, region: Range<usize>) -> Result<(), SinkError> {
        self.check_region(&region)?;
        if region.is_empty() {
            return Ok(());
        }

        let mut kept = Vec::with_capacity(self.annotations.len());
        for ann in self.annotations.drain(..) {
            let touches = ann.kind == kind && ann.start < region.end && region.start < ann.end;
            if !touches {
                kept.push(ann);
                continue;
            }
            // Keep whatever sticks out on either side of the cleared region
            if ann.start < region.start {
                kept.push(Annotation {
                    end: region.start,
                    ..ann.clone()
                });
            }
            if ann.end > region.end {
                kept.push(Annotation {
                    start: region.end,
                    ..ann
                });
            }
        }
        self.annotations = kept;
        Ok(())
    }

    fn annotate(&mut self, kind: &str, region: Range<usize>, style: Style) -> Result<(), SinkError> {
        self.check_region(&region)?;
        if region.is_empty() {
            return Ok(());
        }
        self.annotations.push(Annotation {
            kind: kind.to_string(),
            start: region.start,
            end: region.end,
            style,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Color;

    fn red() -> Style {
        Style::fg(Color::Red)
    }

    #[test]
    fn test_annotate_and_query() {
        let mut surface = TextSurface::from_text("hello world");
        surface.annotate("word", 0..5, red()).unwrap();
        assert_eq!(surface.annotations_at(2).len(), 1);
        assert!(surface.annotations_at(5).is_empty());
        assert_eq!(surface.style_at(0), red());
        assert!(surface.style_at(6).is_default());
    }

    #[test]
    fn test_annotate_out_of_bounds() {
        let mut surface = TextSurface::from_text("abc");
        let err = surface.annotate("word", 1..10, red()).unwrap_err();
        assert_eq!(err, SinkError::OutOfBounds { start: 1, end: 10, len: 3 });
        assert!(surface.annotations().is_empty());
    }

    #[test]
    fn test_annotate_rejects_split_characters() {
        let mut surface = TextSurface::from_text("é");
        assert_eq!(
            surface.annotate("x", 0..1, red()),
            Err(SinkError::NotCharBoundary { offset: 1 })
        );
    }

    #[test]
    fn test_clear_unannotated_region_is_noop() {
        let mut surface = TextSurface::from_text("abcdef");
        surface.annotate("word", 0..2, red()).unwrap();
        let before = surface.annotations().to_vec();

        surface.clear_annotations("word", 3..6).unwrap();
        surface.clear_annotations("other", 0..6).unwrap();
        surface.clear_annotations("word", 2..2).unwrap();
        assert_eq!(surface.annotations(), before.as_slice());
    }

    #[test]
    fn test_clear_splits_annotations() {
        let mut surface = TextSurface::from_text("abcdefgh");
        surface.annotate("word", 0..8, red()).unwrap();
        surface.clear_annotations("word", 2..5).unwrap();

        let ranges: Vec<_> = surface.annotations_of("word").iter().map(|a| a.range()).collect();
        assert_eq!(ranges, vec![0..2, 5..8]);
    }

    #[test]
    fn test_insert_shifts_annotations() {
        let mut surface = TextSurface::from_text("ab cd");
        surface.annotate("w", 0..2, red()).unwrap();
        surface.annotate("w", 3..5, red()).unwrap();

        let edit = surface.insert(3, "xx").unwrap();
        assert_eq!(edit, Edit::new(3, 0, 2));
        assert_eq!(surface.text(), "ab xxcd");

        let ranges: Vec<_> = surface.annotations_of("w").iter().map(|a| a.range()).collect();
        assert_eq!(ranges, vec![0..2, 5..7]);
        assert!(surface.is_modified());
    }

    #[test]
    fn test_insert_inside_annotation_grows_it() {
        let mut surface = TextSurface::from_text("abcd");
        surface.annotate("w", 0..4, red()).unwrap();
        surface.insert(2, "zz").unwrap();
        assert_eq!(surface.annotations()[0].range(), 0..6);
    }

    #[test]
    fn test_delete_trims_annotations() {
        let mut surface = TextSurface::from_text("one two three");
        surface.annotate("w", 0..3, red()).unwrap();
        surface.annotate("w", 4..7, red()).unwrap();
        surface.annotate("w", 8..13, red()).unwrap();

        let (removed, edit) = surface.delete(2..6).unwrap();
        assert_eq!(removed, "e tw");
        assert_eq!(edit, Edit::new(2, 4, 0));
        assert_eq!(surface.text(), "ono three");

        let ranges: Vec<_> = surface.annotations_of("w").iter().map(|a| a.range()).collect();
        assert_eq!(ranges, vec![0..2, 2..3, 4..9]);
    }

    #[test]
    fn test_set_text_drops_annotations() {
        let mut surface = TextSurface::from_text("abc");
        surface.annotate("w", 0..3, red()).unwrap();
        let edit = surface.set_text("longer text");
        assert_eq!(edit, Edit::new(0, 3, 11));
        assert!(surface.annotations().is_empty());
        assert!(!surface.is_modified());
    }

    #[test]
    fn test_lines() {
        let surface = TextSurface::from_text("a\nbc\n\nd");
        assert_eq!(surface.line_count(), 4);
        assert_eq!(TextSurface::from_text("a\n").line_count(), 2);
        assert_eq!(TextSurface::new().line_count(), 1);
    }
}
