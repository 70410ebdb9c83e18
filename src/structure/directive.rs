//! Directives describing the structure of inserted text.

use crate::attributes::AttributeSet;
use std::fmt;
use std::sync::Arc;

/// How a directive attaches to the elements around the edit point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JoinMode {
    /// Create a new element.
    #[default]
    Originate,
    /// Extend the element just before the edit point.
    JoinPrevious,
    /// Extend the element just after the edit point.
    JoinNext,
    /// Continue in the remainder of the branch split at the edit point.
    Fracture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    StartParagraph,
    EndParagraph,
    Content,
}

/// One piece of the structure being inserted.
///
/// A sequence reads like markup: `EndParagraph` closes the branch the
/// edit point is in, `StartParagraph` opens one, and `Content` adds a run of
/// text with its character attributes.
#[derive(Clone, Debug)]
pub struct Directive {
    kind: DirectiveKind,
    attributes: AttributeSet,
    join: JoinMode,
    length: usize,
    text: Option<Arc<str>>,
}

impl Directive {
    #[must_use]
    pub fn start_paragraph(attributes: AttributeSet) -> Self {
        Self::new(DirectiveKind::StartParagraph, attributes, 0, None)
    }

    #[must_use]
    pub fn end_paragraph() -> Self {
        Self::new(DirectiveKind::EndParagraph, AttributeSet::empty(), 0, None)
    }

    /// A run of `text` carrying `attributes`.
    #[must_use]
    pub fn content(attributes: AttributeSet, text: &str) -> Self {
        Self::new(
            DirectiveKind::Content,
            attributes,
            text.chars().count(),
            Some(Arc::from(text)),
        )
    }

    /// A run of `length` chars already present in the content.
    pub(crate) fn run(attributes: AttributeSet, length: usize) -> Self {
        Self::new(DirectiveKind::Content, attributes, length, None)
    }

    fn new(kind: DirectiveKind, attributes: AttributeSet, length: usize, text: Option<Arc<str>>) -> Self {
        Self {
            kind,
            attributes,
            join: JoinMode::Originate,
            length,
            text,
        }
    }

    /// Builder-style join mode.
    #[must_use]
    pub fn with_join(mut self, join: JoinMode) -> Self {
        self.join = join;
        self
    }

    pub fn set_join(&mut self, join: JoinMode) {
        self.join = join;
    }

    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    #[must_use]
    pub fn join(&self) -> JoinMode {
        self.join
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Chars covered; 0 for paragraph boundaries.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DirectiveKind::StartParagraph => "start",
            DirectiveKind::EndParagraph => "end",
            DirectiveKind::Content => "content",
        };
        let join = match self.join {
            JoinMode::Originate => "originate",
            JoinMode::JoinPrevious => "join-previous",
            JoinMode::JoinNext => "join-next",
            JoinMode::Fracture => "fracture",
        };
        write!(f, "{kind}:{join}")?;
        if self.kind == DirectiveKind::Content {
            write!(f, ":{}", self.length)?;
        }
        Ok(())
    }
}
