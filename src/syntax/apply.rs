//! Tag applicator
//!
//! Replaces the grammar's annotations over a region: every kind the grammar
//! knows is cleared first, then each span is painted in order.

use std::ops::Range;

use super::grammar::Grammar;
use super::matcher::Span;
use super::sink::AnnotationSink;
use crate::error::SinkError;

/// Paints spans produced from one grammar onto a sink
pub struct TagApplicator<'g> {
    grammar: &'g Grammar,
}

impl<'g> TagApplicator<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Clear stale annotations in `region`, then annotate every span
    ///
    /// Stops at the first request the sink refuses.
    pub fn apply<'s, I, S>(&self, region: Range<usize>, spans: I, sink: &mut S) -> Result<(), SinkError>
    where
        I: IntoIterator<Item = &'s Span>,
        S: AnnotationSink + ?Sized,
    {
        for kind in self.grammar.kinds() {
            sink.clear_annotations(kind, region.clone())?;
        }

        for span in spans {
            let rule = self.grammar.rule(span.rule);
            sink.annotate(&rule.name, span.range(), rule.style)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextSurface;
    use crate::syntax::matcher::match_region;
    use crate::syntax::rules::Rule;
    use crate::syntax::style::{Color, Style};

    fn digits() -> Grammar {
        let rule = Rule::new("number", r"\d+", Style::fg(Color::Cyan)).unwrap();
        Grammar::new("test", vec![rule]).unwrap()
    }

    #[test]
    fn test_apply_tags_spans() {
        let grammar = digits();
        let mut surface = TextSurface::from_text("a12b34");
        let spans = match_region(surface.text(), &grammar, 0..6);

        TagApplicator::new(&grammar).apply(0..6, &spans, &mut surface).unwrap();

        let tagged: Vec<_> = surface.annotations_of("number").iter().map(|a| a.range()).collect();
        assert_eq!(tagged, vec![1..3, 4..6]);
        assert!(surface.annotations().iter().all(|a| a.style == Style::fg(Color::Cyan)));
    }

    #[test]
    fn test_apply_replaces_stale_annotations() {
        let grammar = digits();
        let mut surface = TextSurface::from_text("a12b34");
        let applicator = TagApplicator::new(&grammar);

        let spans = match_region(surface.text(), &grammar, 0..6);
        applicator.apply(0..6, &spans, &mut surface).unwrap();

        surface.delete(1..3).unwrap();
        surface.insert(1, "xy").unwrap();
        let spans = match_region(surface.text(), &grammar, 0..6);
        applicator.apply(0..6, &spans, &mut surface).unwrap();

        let tagged: Vec<_> = surface.annotations_of("number").iter().map(|a| a.range()).collect();
        assert_eq!(tagged, vec![4..6]);
    }

    #[test]
    fn test_apply_leaves_other_kinds_alone() {
        let grammar = digits();
        let mut surface = TextSurface::from_text("a12b34");
        surface.annotate("find_match", 0..2, Style::default()).unwrap();

        let spans = match_region(surface.text(), &grammar, 0..6);
        TagApplicator::new(&grammar).apply(0..6, &spans, &mut surface).unwrap();

        assert_eq!(surface.annotations_of("find_match").len(), 1);
    }

    #[test]
    fn test_apply_out_of_bounds() {
        let grammar = digits();
        let mut surface = TextSurface::from_text("a12b34");
        let spans = match_region(surface.text(), &grammar, 0..6);
        surface.delete(3..6).unwrap();

        let err = TagApplicator::new(&grammar)
            .apply(0..6, &spans, &mut surface)
            .unwrap_err();
        assert!(matches!(err, SinkError::OutOfBounds { .. }));
    }
}
