//! Tokenizer/matcher
//!
//! Scans a region of text against every rule of a grammar and resolves the
//! candidates into a sorted, non-overlapping span sequence. When two rules
//! claim the same text the earlier-declared rule wins; later matches are
//! truncated to whatever part of them is still free.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::{Duration, Instant};

use super::grammar::Grammar;
use super::rules::{Rule, RuleId};
use crate::error::PatternMatchError;

/// A matched interval of document text, `[start, end)` in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Rule that produced the span
    pub rule: RuleId,
    /// Byte offset where this span starts (inclusive)
    pub start: usize,
    /// Byte offset where this span ends (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(rule: RuleId, start: usize, end: usize) -> Self {
        Self { rule, start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Check whether two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The resolved output of one matching run
///
/// Spans are sorted by start offset and never overlap. The sequence can be
/// iterated any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spans {
    spans: Vec<Span>,
    skipped: Vec<PatternMatchError>,
}

impl Spans {
    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Rules abandoned during the run because they exceeded their budget
    pub fn skipped(&self) -> &[PatternMatchError] {
        &self.skipped
    }

    /// `(start, end)` pairs, mostly useful for assertions
    pub fn ranges(&self) -> Vec<(usize, usize)> {
        self.spans.iter().map(|s| (s.start, s.end)).collect()
    }
}

impl IntoIterator for Spans {
    type Item = Span;
    type IntoIter = std::vec::IntoIter<Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.into_iter()
    }
}

impl<'a> IntoIterator for &'a Spans {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Per-rule limits on a matching run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBudget {
    /// Wall-clock time one rule may spend on a region
    pub per_rule: Duration,
    /// Matches one rule may produce on a region
    pub max_matches: usize,
}

impl Default for MatchBudget {
    fn default() -> Self {
        Self {
            per_rule: Duration::from_millis(50),
            max_matches: 100_000,
        }
    }
}

/// Clamp a region to the text and widen it to char boundaries
pub fn clamp_region(text: &str, region: Range<usize>) -> Range<usize> {
    let len = text.len();
    let mut start = region.start.min(len);
    let mut end = region.end.min(len).max(start);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while !text.is_char_boundary(end) {
        end += 1;
    }
    start..end
}

/// Match `region` of `text` against `grammar` with the default budget
pub fn match_region(text: &str, grammar: &Grammar, region: Range<usize>) -> Spans {
    Matcher::default().run(text, grammar, region)
}

/// Runs grammars over text; holds nothing but its budget
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    budget: MatchBudget,
}

impl Matcher {
    pub fn with_budget(budget: MatchBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> MatchBudget {
        self.budget
    }

    /// Tokenize `region` of `text`
    ///
    /// Matches may start anywhere inside the region and are clipped at its
    /// end. The result is sorted, non-overlapping and fully determined by the
    /// inputs (unless a rule runs out of time).
    pub fn run(&self, text: &str, grammar: &Grammar, region: Range<usize>) -> Spans {
        self.run_rules(text, grammar.iter(), region)
    }

    /// Tokenize `region` with a subset of a grammar's rules
    ///
    /// `rules` must come in declaration order; precedence is decided by the
    /// order they are given in.
    pub fn run_rules<'g, I>(&self, text: &str, rules: I, region: Range<usize>) -> Spans
    where
        I: IntoIterator<Item = (RuleId, &'g Rule)>,
    {
        let region = clamp_region(text, region);
        let mut claimed = Claimed::default();
        let mut spans = Vec::new();
        let mut skipped = Vec::new();

        for (id, rule) in rules {
            let candidates = match self.collect_rule(text, rule, region.clone()) {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping rule for this pass");
                    skipped.push(err);
                    continue;
                }
            };

            for (start, end) in candidates {
                for (s, e) in claimed.claim(start, end) {
                    tracing::trace!(rule = %rule.name, start = s, end = e, "span");
                    spans.push(Span::new(id, s, e));
                }
            }
        }

        spans.sort_by_key(|s| (s.start, s.end));
        Spans { spans, skipped }
    }

    /// All non-overlapping matches of one rule inside the region
    fn collect_rule(
        &self,
        text: &str,
        rule: &Rule,
        region: Range<usize>,
    ) -> Result<Vec<(usize, usize)>, PatternMatchError> {
        let started = Instant::now();
        let mut found = Vec::new();
        let mut pos = region.start;

        while pos < region.end {
            let Some((start, end)) = rule.find_at(text, pos) else {
                break;
            };
            if start >= region.end {
                break;
            }
            found.push((start, end.min(region.end)));
            pos = end;

            let elapsed = started.elapsed();
            if found.len() > self.budget.max_matches || elapsed > self.budget.per_rule {
                return Err(PatternMatchError::BudgetExceeded {
                    rule: rule.name.clone(),
                    matches: found.len(),
                    elapsed,
                });
            }
        }

        Ok(found)
    }
}

/// Byte ranges already owned by higher-precedence rules
#[derive(Debug, Default)]
struct Claimed {
    /// start -> end, pairwise disjoint
    ranges: BTreeMap<usize, usize>,
}

impl Claimed {
    /// Claim whatever part of `[start, end)` is still free
    ///
    /// Returns the free fragments, which are now owned by the caller.
    fn claim(&mut self, start: usize, end: usize) -> Vec<(usize, usize)> {
        // Disjoint ranges sorted by start are also sorted by end, so the
        // overlapping ones are a contiguous run ending before `end`.
        let mut overlapping: Vec<(usize, usize)> = self
            .ranges
            .range(..end)
            .rev()
            .take_while(|&(_, &e)| e > start)
            .map(|(&s, &e)| (s, e))
            .collect();
        overlapping.reverse();

        let mut free = Vec::new();
        let mut cursor = start;
        for (s, e) in overlapping {
            if s > cursor {
                free.push((cursor, s));
            }
            cursor = cursor.max(e);
        }
        if cursor < end {
            free.push((cursor, end));
        }

        for &(s, e) in &free {
            self.ranges.insert(s, e);
        }
        free
    }
}
