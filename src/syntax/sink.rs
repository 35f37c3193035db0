//! The surface the highlighter paints on
//!
//! The engine never owns document text. It reads the text and replaces
//! annotations through this trait; the editor decides what an annotation
//! looks like on screen.

use std::ops::Range;

use super::style::Style;
use crate::error::SinkError;

/// Engine-to-surface interface
pub trait AnnotationSink {
    /// Full document contents
    fn text(&self) -> &str;

    /// Current document length in bytes
    fn len(&self) -> usize {
        self.text().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove annotations of `kind` from `region`
    ///
    /// Clearing a region that carries no such annotation is a no-op.
    fn clear_annotations(&mut self, kind: &str, region: Range<usize>) -> Result<(), SinkError>;

    /// Annotate `region` with `kind`, rendered using `style`
    fn annotate(&mut self, kind: &str, region: Range<usize>, style: Style) -> Result<(), SinkError>;
}
