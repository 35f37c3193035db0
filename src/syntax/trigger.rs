//! Highlight trigger
//!
//! Decides when a pass runs and over which region. Each edit notification
//! runs one synchronous pass; in `Full` mode the pass always covers the whole
//! document, in `Incremental` mode it covers the edited lines plus any
//! multiline match (a docstring, say) that touches them or changed shape.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::highlighter::{PassOutcome, SyntaxHighlighter};
use super::matcher::clamp_region;
use super::sink::AnnotationSink;

/// One text change: `removed` bytes at `offset` replaced by `inserted` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl Edit {
    pub fn new(offset: usize, removed: usize, inserted: usize) -> Self {
        Self {
            offset,
            removed,
            inserted,
        }
    }

    /// Map an offset in the old text to the new text
    fn map(&self, pos: usize) -> usize {
        if pos <= self.offset {
            pos
        } else if pos <= self.offset + self.removed {
            self.offset + self.inserted
        } else {
            pos - self.removed + self.inserted
        }
    }
}

/// Byte range touched by edits since the last pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyRegion {
    range: Option<Range<usize>>,
}

impl DirtyRegion {
    /// Fold an edit into the tracked range
    pub fn record(&mut self, edit: Edit) {
        let touched = edit.offset..edit.offset + edit.inserted;
        self.range = Some(match self.range.take() {
            None => touched,
            Some(old) => {
                let start = edit.map(old.start).min(touched.start);
                let end = edit.map(old.end).max(touched.end);
                start..end
            }
        });
    }

    pub fn range(&self) -> Option<Range<usize>> {
        self.range.clone()
    }

    pub fn is_clean(&self) -> bool {
        self.range.is_none()
    }

    pub fn take(&mut self) -> Option<Range<usize>> {
        self.range.take()
    }
}

/// Widen a byte range to the whole lines it touches (newline included)
///
/// A range that already ends just past a newline is not extended, so
/// widening twice gives the same result.
pub fn line_region(text: &str, range: Range<usize>) -> Range<usize> {
    let Range { start, end } = clamp_region(text, range);
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = if end > start && text.as_bytes()[end - 1] == b'\n' {
        end
    } else {
        text[end..].find('\n').map_or(text.len(), |i| end + i + 1)
    };
    line_start..line_end
}

/// How much text a triggered pass covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    /// Rescan the whole document on every edit
    #[default]
    Full,
    /// Rescan only the edited lines when it is safe to do so
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Scheduled,
}

/// Edit-driven pass scheduler
#[derive(Debug)]
pub struct HighlightTrigger {
    state: TriggerState,
    mode: HighlightMode,
    /// Documents smaller than this are always rescanned in full
    full_rescan_limit: usize,
    dirty: DirtyRegion,
    /// Multiline matches painted by the last pass, shifted through later
    /// edits. `None` when unknown, which forces the next pass to be full.
    multiline: Option<Vec<Range<usize>>>,
}

impl HighlightTrigger {
    pub fn new(mode: HighlightMode, full_rescan_limit: usize) -> Self {
        Self {
            state: TriggerState::Idle,
            mode,
            full_rescan_limit,
            dirty: DirtyRegion::default(),
            multiline: None,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn mode(&self) -> HighlightMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: HighlightMode) {
        self.mode = mode;
    }

    pub fn set_full_rescan_limit(&mut self, limit: usize) {
        self.full_rescan_limit = limit;
    }

    pub fn dirty(&self) -> &DirtyRegion {
        &self.dirty
    }

    /// Forget pending edits and cached matches (new text or new grammar)
    pub fn reset(&mut self) {
        self.dirty.take();
        self.multiline = None;
    }

    /// Remember an edit for the next incremental pass without running one
    pub fn record(&mut self, edit: Edit) {
        self.dirty.record(edit);
        if let Some(spans) = &mut self.multiline {
            for span in spans.iter_mut() {
                *span = edit.map(span.start)..edit.map(span.end);
            }
        }
    }

    /// React to an edit notification
    ///
    /// Runs a pass unless one is already in progress, in which case the edit
    /// is only recorded. Returns `None` when no pass ran.
    pub fn on_edit<S>(
        &mut self,
        edit: Option<Edit>,
        highlighter: &SyntaxHighlighter,
        sink: &mut S,
    ) -> Option<PassOutcome>
    where
        S: AnnotationSink + ?Sized,
    {
        if let Some(edit) = edit {
            self.record(edit);
        }
        if self.state == TriggerState::Scheduled {
            return None;
        }

        let (region, multiline) = self.plan(highlighter, sink.text());
        Some(self.run(region, multiline, highlighter, sink))
    }

    /// Run a pass over a caller-chosen region
    pub fn request<S>(
        &mut self,
        region: Range<usize>,
        highlighter: &SyntaxHighlighter,
        sink: &mut S,
    ) -> Option<PassOutcome>
    where
        S: AnnotationSink + ?Sized,
    {
        if self.state == TriggerState::Scheduled {
            return None;
        }
        Some(self.run(region, None, highlighter, sink))
    }

    /// `multiline` carries the multiline matches already computed for the
    /// current text, if the plan needed them
    fn run<S>(
        &mut self,
        region: Range<usize>,
        multiline: Option<Vec<Range<usize>>>,
        highlighter: &SyntaxHighlighter,
        sink: &mut S,
    ) -> PassOutcome
    where
        S: AnnotationSink + ?Sized,
    {
        self.state = TriggerState::Scheduled;
        let whole = region.start == 0 && region.end >= sink.len();
        let outcome = highlighter.highlight(region, sink);

        let tracked = self.mode == HighlightMode::Incremental
            && highlighter.grammar().has_multiline_rules()
            && outcome != PassOutcome::Abandoned;
        self.multiline = match multiline {
            Some(spans) if tracked => Some(spans),
            None if tracked && whole => Some(highlighter.multiline_spans(sink.text())),
            _ => None,
        };

        self.dirty.take();
        self.state = TriggerState::Idle;
        outcome
    }

    /// Region the next triggered pass should cover
    pub fn region_for(&self, highlighter: &SyntaxHighlighter, text: &str) -> Range<usize> {
        self.plan(highlighter, text).0
    }

    /// Pick the pass region, plus the current multiline matches when the
    /// region had to be widened around them
    fn plan(&self, highlighter: &SyntaxHighlighter, text: &str) -> (Range<usize>, Option<Vec<Range<usize>>>) {
        let full = 0..text.len();
        if self.mode == HighlightMode::Full || text.len() < self.full_rescan_limit {
            return (full, None);
        }
        let Some(dirty) = self.dirty.range() else {
            return (full, None);
        };
        let region = line_region(text, dirty);
        if !highlighter.grammar().has_multiline_rules() {
            return (region, None);
        }
        let Some(previous) = &self.multiline else {
            return (full, None);
        };

        let current = highlighter.multiline_spans(text);
        let region = widen_for_multiline(text, region, previous, &current);
        (region, Some(current))
    }
}

/// Grow a line region so multiline matches are repainted whole
///
/// Covers every multiline match that appeared, vanished or moved since the
/// last pass, and every current one that crosses the region, then snaps the
/// result to whole lines.
fn widen_for_multiline(
    text: &str,
    region: Range<usize>,
    previous: &[Range<usize>],
    current: &[Range<usize>],
) -> Range<usize> {
    let before: HashSet<(usize, usize)> = previous.iter().map(|r| (r.start, r.end)).collect();
    let after: HashSet<(usize, usize)> = current.iter().map(|r| (r.start, r.end)).collect();

    let mut start = region.start;
    let mut end = region.end;
    for &(s, e) in before.symmetric_difference(&after) {
        start = start.min(s);
        end = end.max(e);
    }

    loop {
        let lines = line_region(text, start..end);
        let (mut s, mut e) = (lines.start, lines.end);
        for span in current {
            if span.start < e && s < span.end {
                s = s.min(span.start);
                e = e.max(span.end);
            }
        }
        if (s, e) == (start, end) {
            return start..end;
        }
        start = s;
        end = e;
    }
}

impl Default for HighlightTrigger {
    fn default() -> Self {
        Self::new(HighlightMode::Full, 64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::TextSurface;
    use crate::syntax::grammar::Grammar;
    use crate::syntax::registry::GrammarRegistry;
    use crate::syntax::rules::Rule;
    use crate::syntax::style::{Color, Style};

    fn keyword_highlighter() -> SyntaxHighlighter {
        let rule = Rule::new("keyword", r"\b(def|pass)\b", Style::fg(Color::Magenta)).unwrap();
        SyntaxHighlighter::new(Arc::new(Grammar::new("python", vec![rule]).unwrap()))
    }

    #[test]
    fn test_dirty_region_accumulates() {
        let mut dirty = DirtyRegion::default();
        assert!(dirty.is_clean());

        dirty.record(Edit::new(10, 0, 2));
        assert_eq!(dirty.range(), Some(10..12));

        // An insertion before the range shifts it and extends it
        dirty.record(Edit::new(2, 0, 3));
        assert_eq!(dirty.range(), Some(2..15));

        // A deletion inside it shrinks it
        dirty.record(Edit::new(5, 4, 0));
        assert_eq!(dirty.range(), Some(2..11));

        assert_eq!(dirty.take(), Some(2..11));
        assert!(dirty.is_clean());
    }

    #[test]
    fn test_line_region() {
        let text = "aa\nbbb\ncc";
        assert_eq!(line_region(text, 4..5), 3..7);
        assert_eq!(line_region(text, 0..0), 0..3);
        assert_eq!(line_region(text, 8..9), 7..9);
        assert_eq!(line_region(text, 1..5), 0..7);
        assert_eq!(line_region(text, 50..60), 7..9);
        assert_eq!(line_region(text, 0..3), 0..3);
        assert_eq!(line_region(text, 3..7), 3..7);
    }

    #[test]
    fn test_full_pass_on_edit() {
        let highlighter = keyword_highlighter();
        let mut surface = TextSurface::from_text("def f():\n    pass");
        let mut trigger = HighlightTrigger::default();

        let outcome = trigger.on_edit(None, &highlighter, &mut surface);
        assert!(matches!(outcome, Some(PassOutcome::Applied { .. })));
        assert_eq!(trigger.state(), TriggerState::Idle);

        let tagged: Vec<_> = surface.annotations_of("keyword").iter().map(|a| a.range()).collect();
        assert_eq!(tagged, vec![0..3, 13..17]);
    }

    #[test]
    fn test_full_mode_ignores_dirty_region() {
        let highlighter = keyword_highlighter();
        let trigger = {
            let mut t = HighlightTrigger::new(HighlightMode::Full, 0);
            t.record(Edit::new(3, 0, 1));
            t
        };
        assert_eq!(trigger.region_for(&highlighter, "def x\npass\n"), 0..11);
    }

    #[test]
    fn test_incremental_scans_edited_lines() {
        let highlighter = keyword_highlighter();
        let mut trigger = HighlightTrigger::new(HighlightMode::Incremental, 0);
        let mut surface = TextSurface::from_text("def a\ndef b\ndef c\n");
        trigger.on_edit(None, &highlighter, &mut surface);
        assert_eq!(surface.annotations_of("keyword").len(), 3);

        // Break the keyword on line 2; only that line is rescanned
        let edit = surface.insert(7, "x").unwrap();
        assert_eq!(trigger.region_for(&highlighter, surface.text()), 0..19);
        trigger.record(edit);
        assert_eq!(trigger.region_for(&highlighter, surface.text()), 6..13);

        trigger.on_edit(None, &highlighter, &mut surface);
        let tagged: Vec<_> = surface.annotations_of("keyword").iter().map(|a| a.range()).collect();
        assert_eq!(tagged, vec![0..3, 13..16]);
        assert!(trigger.dirty().is_clean());
    }

    #[test]
    fn test_incremental_falls_back_for_small_documents() {
        let highlighter = keyword_highlighter();
        let mut trigger = HighlightTrigger::new(HighlightMode::Incremental, 1024);
        trigger.record(Edit::new(7, 0, 1));
        assert_eq!(trigger.region_for(&highlighter, "def a\ndxef b\n"), 0..13);
    }

    #[test]
    fn test_incremental_multiline_needs_a_previous_pass() {
        let rule = Rule::new("doc", r#"(?s)""".*?""""#, Style::default())
            .unwrap()
            .spanning_lines();
        let highlighter = SyntaxHighlighter::new(Arc::new(Grammar::new("py", vec![rule]).unwrap()));
        let mut trigger = HighlightTrigger::new(HighlightMode::Incremental, 0);
        trigger.record(Edit::new(1, 0, 1));
        assert_eq!(trigger.region_for(&highlighter, "ab\ncd\n"), 0..6);
    }

    fn builtin_python() -> SyntaxHighlighter {
        let registry = GrammarRegistry::with_builtins();
        SyntaxHighlighter::new(registry.get("python").expect("builtin python grammar"))
    }

    fn ranges(surface: &TextSurface, kind: &str) -> Vec<Range<usize>> {
        surface.annotations_of(kind).iter().map(|a| a.range()).collect()
    }

    #[test]
    fn test_incremental_with_builtin_python_scans_one_line() {
        let highlighter = builtin_python();
        assert!(highlighter.grammar().has_multiline_rules());

        let text = format!("\"\"\"module\"\"\"\n{}", "x = 1\n".repeat(200));
        let mut surface = TextSurface::from_text(text);
        let mut trigger = HighlightTrigger::new(HighlightMode::Incremental, 0);
        trigger.on_edit(None, &highlighter, &mut surface);
        assert_eq!(ranges(&surface, "docstring"), vec![0..12]);

        // Line 10 starts at 13 + 9 * 6
        let edit = surface.insert(67, "pass; ").unwrap();
        trigger.record(edit);
        assert_eq!(trigger.region_for(&highlighter, surface.text()), 67..79);

        trigger.on_edit(None, &highlighter, &mut surface);
        assert_eq!(ranges(&surface, "keyword"), vec![67..71]);
        assert_eq!(ranges(&surface, "docstring"), vec![0..12]);
    }

    #[test]
    fn test_incremental_repaints_changed_docstring() {
        let highlighter = builtin_python();
        let mut surface = TextSurface::from_text("a = 1\nb = 2\nc = 3\n\"\"\"\nd = 4\n");
        let mut trigger = HighlightTrigger::new(HighlightMode::Incremental, 0);
        trigger.on_edit(None, &highlighter, &mut surface);
        assert!(ranges(&surface, "docstring").is_empty());
        assert_eq!(ranges(&surface, "number"), vec![4..5, 10..11, 16..17, 26..27]);

        // Opening quotes on line 2 turn lines 2-4 into a docstring
        let edit = surface.insert(6, "\"\"\"").unwrap();
        trigger.record(edit);
        assert_eq!(trigger.region_for(&highlighter, surface.text()), 6..25);
        trigger.on_edit(None, &highlighter, &mut surface);
        assert_eq!(ranges(&surface, "docstring"), vec![6..24]);
        assert_eq!(ranges(&surface, "number"), vec![4..5, 29..30]);

        // Removing them again repaints the lines the docstring used to cover
        let (_, edit) = surface.delete(6..9).unwrap();
        trigger.on_edit(Some(edit), &highlighter, &mut surface);
        assert!(ranges(&surface, "docstring").is_empty());
        assert_eq!(ranges(&surface, "number"), vec![4..5, 10..11, 16..17, 26..27]);
    }

    #[test]
    fn test_reset_forces_full_pass() {
        let highlighter = builtin_python();
        let mut surface = TextSurface::from_text("x = 1\ny = 2\n");
        let mut trigger = HighlightTrigger::new(HighlightMode::Incremental, 0);
        trigger.on_edit(None, &highlighter, &mut surface);

        trigger.record(surface.insert(0, "z").unwrap());
        assert_eq!(trigger.region_for(&highlighter, surface.text()), 0..7);
        trigger.reset();
        trigger.record(surface.insert(0, "z").unwrap());
        assert_eq!(trigger.region_for(&highlighter, surface.text()), 0..14);
    }

    #[test]
    fn test_explicit_region_request() {
        let highlighter = keyword_highlighter();
        let mut surface = TextSurface::from_text("def a\ndef b\n");
        let mut trigger = HighlightTrigger::default();
        trigger.request(6..12, &highlighter, &mut surface);

        let tagged: Vec<_> = surface.annotations_of("keyword").iter().map(|a| a.range()).collect();
        assert_eq!(tagged, vec![6..9]);
    }
}
