//! Syntax highlighting engine
//!
//! A pass flows leaf to root through these modules:
//! - `grammar`: ordered rule sets loaded from grammar documents
//! - `matcher`: text + grammar + region to sorted, non-overlapping spans
//! - `apply`: clears stale annotations and paints spans onto a sink
//! - `trigger`: decides when a pass runs and over what region

mod apply;
mod grammar;
mod highlighter;
mod matcher;
mod registry;
mod rules;
mod sink;
mod style;
mod trigger;

pub use apply::TagApplicator;
pub use grammar::Grammar;
pub use highlighter::{PassOutcome, SyntaxHighlighter};
pub use matcher::{clamp_region, match_region, MatchBudget, Matcher, Span, Spans};
pub use registry::GrammarRegistry;
pub use rules::{Rule, RuleId};
pub use sink::AnnotationSink;
pub use style::{Color, Style, StyleSpec};
pub use trigger::{line_region, DirtyRegion, Edit, HighlightMode, HighlightTrigger, TriggerState};
