//! One highlighting pass: match a region, then paint it
//!
//! Highlighting is cosmetic, so a pass never reports an error. If the
//! surface refuses the annotations the region is clamped to the surface's
//! current length and the pass is retried once; after that it is abandoned.

use std::ops::Range;
use std::sync::Arc;

use super::apply::TagApplicator;
use super::grammar::Grammar;
use super::matcher::{clamp_region, Matcher, Spans};
use super::sink::AnnotationSink;

/// What happened to a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The region was repainted with these spans
    Applied { region: Range<usize>, spans: Spans },
    /// The surface rejected the pass twice; nothing more was attempted
    Abandoned,
}

/// Highlights documents of one language
///
/// The grammar is shared; any number of highlighters (one per open
/// document) may hold the same `Arc<Grammar>`.
#[derive(Debug, Clone)]
pub struct SyntaxHighlighter {
    grammar: Arc<Grammar>,
    matcher: Matcher,
}

impl SyntaxHighlighter {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            matcher: Matcher::default(),
        }
    }

    /// Builder: use a specific matcher (e.g. a tighter budget)
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn language(&self) -> &str {
        &self.grammar.language
    }

    /// Tokenize without touching any surface
    pub fn spans(&self, text: &str, region: Range<usize>) -> Spans {
        self.matcher.run(text, &self.grammar, region)
    }

    /// Matches of the grammar's multiline rules over the whole text
    pub fn multiline_spans(&self, text: &str) -> Vec<Range<usize>> {
        let rules = self.grammar.iter().filter(|(_, rule)| rule.multiline);
        self.matcher
            .run_rules(text, rules, 0..text.len())
            .iter()
            .map(|s| s.range())
            .collect()
    }

    /// Highlight the whole document
    pub fn highlight_all<S>(&self, sink: &mut S) -> PassOutcome
    where
        S: AnnotationSink + ?Sized,
    {
        self.highlight(0..sink.len(), sink)
    }

    /// Run one pass over `region` of the sink's text
    pub fn highlight<S>(&self, region: Range<usize>, sink: &mut S) -> PassOutcome
    where
        S: AnnotationSink + ?Sized,
    {
        let applicator = TagApplicator::new(&self.grammar);

        let region = clamp_region(sink.text(), region);
        let spans = self.spans(sink.text(), region.clone());
        let first = match applicator.apply(region.clone(), &spans, sink) {
            Ok(()) => {
                tracing::debug!(
                    language = %self.grammar.language,
                    start = region.start,
                    end = region.end,
                    spans = spans.len(),
                    "highlight pass applied"
                );
                return PassOutcome::Applied { region, spans };
            }
            Err(err) => err,
        };

        // The surface changed under us; retry once against its current text
        tracing::debug!(error = %first, "highlight pass rejected, retrying with clamped region");
        let region = clamp_region(sink.text(), region);
        let spans = self.spans(sink.text(), region.clone());
        match applicator.apply(region.clone(), &spans, sink) {
            Ok(()) => PassOutcome::Applied { region, spans },
            Err(err) => {
                tracing::debug!(error = %err, "highlight pass abandoned");
                PassOutcome::Abandoned
            }
        }
    }
}
