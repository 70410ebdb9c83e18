//! Document construction options.

use crate::attributes::AttributeContext;
use crate::bidi::{BidiAnalyzer, Direction, UnicodeBidiAnalyzer};
use crate::content::DEFAULT_INITIAL_CAPACITY;
use std::fmt;
use std::sync::Arc;

/// Number of element edits in one event above which lookups by element use a hash map.
pub const DEFAULT_EDIT_LOOKUP_THRESHOLD: usize = 10;

/// Document configuration.
///
/// Every field has a default; the `with_*` methods chain for the ones that
/// differ.
///
/// # Examples
///
/// ```
/// use docmodel::{Direction, Document, DocumentConfig};
///
/// let config = DocumentConfig::default()
///     .with_initial_capacity(256)
///     .with_run_direction(Direction::Rtl);
/// let doc = Document::with_config(config);
/// assert!(doc.is_empty());
/// ```
#[derive(Clone)]
pub struct DocumentConfig {
    /// Initial gap buffer size, in chars.
    pub initial_capacity: usize,
    /// Element edits per event before lookups switch to a hash map.
    pub edit_lookup_threshold: usize,
    /// Paragraph direction used when a paragraph sets none. `None` lets the
    /// text decide.
    pub run_direction: Option<Direction>,
    /// Source of bidi embedding levels.
    pub bidi_analyzer: Arc<dyn BidiAnalyzer>,
    /// Pool the document's attribute sets are interned in.
    pub attribute_context: Arc<AttributeContext>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            edit_lookup_threshold: DEFAULT_EDIT_LOOKUP_THRESHOLD,
            run_direction: None,
            bidi_analyzer: Arc::new(UnicodeBidiAnalyzer::new()),
            attribute_context: AttributeContext::shared(),
        }
    }
}

impl DocumentConfig {
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_edit_lookup_threshold(mut self, threshold: usize) -> Self {
        self.edit_lookup_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_run_direction(mut self, direction: Direction) -> Self {
        self.run_direction = Some(direction);
        self
    }

    #[must_use]
    pub fn with_bidi_analyzer(mut self, analyzer: Arc<dyn BidiAnalyzer>) -> Self {
        self.bidi_analyzer = analyzer;
        self
    }

    #[must_use]
    pub fn with_attribute_context(mut self, context: Arc<AttributeContext>) -> Self {
        self.attribute_context = context;
        self
    }

    /// Use a private attribute pool interning sets of at most `threshold` entries.
    #[must_use]
    pub fn with_compression_threshold(self, threshold: usize) -> Self {
        self.with_attribute_context(Arc::new(AttributeContext::with_threshold(threshold)))
    }
}

impl fmt::Debug for DocumentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentConfig")
            .field("initial_capacity", &self.initial_capacity)
            .field("edit_lookup_threshold", &self.edit_lookup_threshold)
            .field("run_direction", &self.run_direction)
            .field(
                "compression_threshold",
                &self.attribute_context.compression_threshold(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DEFAULT_COMPRESSION_THRESHOLD;

    #[test]
    fn defaults() {
        let config = DocumentConfig::default();
        assert_eq!(config.initial_capacity, 10);
        assert_eq!(config.edit_lookup_threshold, 10);
        assert_eq!(config.run_direction, None);
        assert_eq!(
            config.attribute_context.compression_threshold(),
            DEFAULT_COMPRESSION_THRESHOLD
        );
    }

    #[test]
    fn builder_overrides() {
        let config = DocumentConfig::default()
            .with_initial_capacity(64)
            .with_edit_lookup_threshold(2)
            .with_run_direction(Direction::Rtl)
            .with_compression_threshold(3);
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.edit_lookup_threshold, 2);
        assert_eq!(config.run_direction, Some(Direction::Rtl));
        assert_eq!(config.attribute_context.compression_threshold(), 3);
        assert!(format!("{config:?}").contains("compression_threshold: 3"));
    }
}
