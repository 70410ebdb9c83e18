//! Document structure tree.
//!
//! Branches hold an ordered list of children; leaves cover a `[start, end)`
//! range through two [`Position`]s, so their bounds follow content edits
//! without touching the tree. Branch bounds are derived from the first and
//! last child.
//!
//! Parent links are fixed when an element is created. The tree is only
//! restructured by the element buffer and by undo/redo of recorded edits,
//! both under the document's write lock.

mod edit;

pub use edit::{AttributeEdit, ElementEdit};

use crate::attributes::AttributeSet;
use crate::content::Position;
use crate::event::structural_fault;
use std::fmt::{self, Write as _};
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, Weak};

/// Names elements report when their attributes do not override them.
pub mod names {
    pub const SECTION: &str = "section";
    pub const PARAGRAPH: &str = "paragraph";
    pub const CONTENT: &str = "content";
    pub const BIDI_ROOT: &str = "bidi root";
    pub const BIDI_LEVEL: &str = "bidi level";
}

enum NodeKind {
    Branch(RwLock<Vec<Element>>),
    Leaf { start: Position, end: Position },
}

struct ElementNode {
    parent: Weak<ElementNode>,
    default_name: &'static str,
    attributes: RwLock<AttributeSet>,
    kind: NodeKind,
}

/// A node of a document tree.
///
/// Cloning is cheap and yields another handle to the same node; `==`
/// compares identity. Compare [`dump`](Self::dump) output for structural
/// equality.
#[derive(Clone)]
pub struct Element(Arc<ElementNode>);

impl Element {
    pub(crate) fn new_branch(
        parent: Option<&Self>,
        default_name: &'static str,
        attributes: AttributeSet,
    ) -> Self {
        Self(Arc::new(ElementNode {
            parent: parent.map_or_else(Weak::new, |p| Arc::downgrade(&p.0)),
            default_name,
            attributes: RwLock::new(attributes),
            kind: NodeKind::Branch(RwLock::new(Vec::new())),
        }))
    }

    pub(crate) fn new_leaf(
        parent: Option<&Self>,
        default_name: &'static str,
        attributes: AttributeSet,
        start: Position,
        end: Position,
    ) -> Self {
        Self(Arc::new(ElementNode {
            parent: parent.map_or_else(Weak::new, |p| Arc::downgrade(&p.0)),
            default_name,
            attributes: RwLock::new(attributes),
            kind: NodeKind::Leaf { start, end },
        }))
    }

    /// Element name: the `NAME` attribute if set, otherwise the kind's default.
    #[must_use]
    pub fn name(&self) -> String {
        let attributes = self.attributes();
        attributes
            .element_name()
            .map_or_else(|| self.0.default_name.to_string(), str::to_string)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.0.kind, NodeKind::Leaf { .. })
    }

    /// The parent, unless this is a root or the parent was dropped.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.parent.upgrade().map(Self)
    }

    /// Current attributes.
    #[must_use]
    pub fn attributes(&self) -> AttributeSet {
        self.0
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_attributes(&self, attributes: AttributeSet) {
        *self
            .0
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner) = attributes;
    }

    /// First offset covered. An empty branch reports 0.
    #[must_use]
    pub fn start_offset(&self) -> usize {
        match &self.0.kind {
            NodeKind::Leaf { start, .. } => start.offset(),
            NodeKind::Branch(_) => self.read_children().first().map_or(0, Self::start_offset),
        }
    }

    /// One past the last offset covered. An empty branch reports 0.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        match &self.0.kind {
            NodeKind::Leaf { end, .. } => end.offset(),
            NodeKind::Branch(_) => self.read_children().last().map_or(0, Self::end_offset),
        }
    }

    /// `start_offset()..end_offset()`.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start_offset()..self.end_offset()
    }

    /// Number of children; 0 for leaves.
    #[must_use]
    pub fn element_count(&self) -> usize {
        match &self.0.kind {
            NodeKind::Leaf { .. } => 0,
            NodeKind::Branch(_) => self.read_children().len(),
        }
    }

    /// Child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        match &self.0.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Branch(_) => self.read_children().get(index).cloned(),
        }
    }

    /// Snapshot of the children.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        match &self.0.kind {
            NodeKind::Leaf { .. } => Vec::new(),
            NodeKind::Branch(_) => self.read_children().clone(),
        }
    }

    /// Index of the child covering `offset`.
    ///
    /// Ranges are half-open, so an offset on a boundary belongs to the
    /// following child. Offsets at or past the end map to the last child.
    /// Leaves and empty branches return 0.
    #[must_use]
    pub fn element_index(&self, offset: usize) -> usize {
        let NodeKind::Branch(_) = &self.0.kind else {
            return 0;
        };
        let children = self.read_children();
        let n = children.len();
        if n == 0 {
            return 0;
        }
        if offset >= children[n - 1].end_offset() {
            return n - 1;
        }

        let (mut lower, mut upper) = (0, n);
        let mut mid = 0;
        let mut p0 = children[0].start_offset();
        while lower < upper {
            mid = lower + (upper - lower) / 2;
            p0 = children[mid].start_offset();
            let p1 = children[mid].end_offset();
            if offset >= p0 && offset < p1 {
                return mid;
            }
            if offset < p0 {
                upper = mid;
            } else {
                lower = mid + 1;
            }
        }
        let index = if offset < p0 { mid } else { mid + 1 };
        index.min(n - 1)
    }

    /// Start position of a leaf.
    #[must_use]
    pub fn start_position(&self) -> Option<&Position> {
        match &self.0.kind {
            NodeKind::Leaf { start, .. } => Some(start),
            NodeKind::Branch(_) => None,
        }
    }

    /// End position of a leaf.
    #[must_use]
    pub fn end_position(&self) -> Option<&Position> {
        match &self.0.kind {
            NodeKind::Leaf { end, .. } => Some(end),
            NodeKind::Branch(_) => None,
        }
    }

    /// True if both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The deepest leaf covering `offset`.
    #[must_use]
    pub fn leaf_at(&self, offset: usize) -> Self {
        let mut elem = self.clone();
        while let Some(child) = elem.child(elem.element_index(offset)) {
            elem = child;
        }
        elem
    }

    /// The branch directly holding the leaf at `offset`.
    #[must_use]
    pub fn paragraph_at(&self, offset: usize) -> Option<Self> {
        self.leaf_at(offset).parent()
    }

    /// Indented structural dump, one element per line.
    ///
    /// ```text
    /// section [0,6)
    ///   paragraph [0,3)
    ///     content [0,3)
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = write!(out, "{self}");
        let attributes = self.attributes();
        if attributes.iter().next().is_some() {
            let _ = write!(out, " {attributes}");
        }
        out.push('\n');
        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }

    /// Splice `added` over `remove` children starting at `index`.
    pub(crate) fn replace(&self, index: usize, remove: usize, added: Vec<Self>) {
        let NodeKind::Branch(children) = &self.0.kind else {
            structural_fault("replace on a leaf element");
        };
        let mut children = children.write().unwrap_or_else(PoisonError::into_inner);
        if index + remove > children.len() {
            structural_fault(&format!(
                "replace {index}+{remove} outside {} children of {}",
                children.len(),
                self.0.default_name
            ));
        }
        children.splice(index..index + remove, added);
    }

    /// True if the children at `index` are exactly `expected`, by identity.
    pub(crate) fn children_match(&self, index: usize, expected: &[Self]) -> bool {
        let children = self.read_children();
        children.get(index..index + expected.len()).is_some_and(|slice| {
            slice
                .iter()
                .zip(expected)
                .all(|(a, b)| a.ptr_eq(b))
        })
    }

    fn read_children(&self) -> RwLockReadGuard<'_, Vec<Self>> {
        match &self.0.kind {
            NodeKind::Branch(children) => children.read().unwrap_or_else(PoisonError::into_inner),
            NodeKind::Leaf { .. } => structural_fault("children of a leaf element"),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl std::hash::Hash for Element {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{},{})",
            self.name(),
            self.start_offset(),
            self.end_offset()
        )
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::keys;
    use crate::content::GapContent;

    fn leaf(parent: &Element, content: &mut GapContent, start: usize, end: usize) -> Element {
        Element::new_leaf(
            Some(parent),
            names::CONTENT,
            AttributeSet::empty(),
            content.create_position(start).unwrap(),
            content.create_position(end).unwrap(),
        )
    }

    fn paragraph_of(content: &mut GapContent, bounds: &[usize]) -> Element {
        let para = Element::new_branch(None, names::PARAGRAPH, AttributeSet::empty());
        let leaves = bounds
            .windows(2)
            .map(|w| leaf(&para, content, w[0], w[1]))
            .collect();
        para.replace(0, 0, leaves);
        para
    }

    #[test]
    fn branch_bounds_come_from_children() {
        let mut content = GapContent::new();
        content.insert_string(0, "abcdefghi").unwrap();
        let para = paragraph_of(&mut content, &[0, 3, 7, 10]);
        assert_eq!(para.range(), 0..10);
        assert_eq!(para.element_count(), 3);
        assert_eq!(para.child(1).unwrap().parent(), Some(para.clone()));
    }

    #[test]
    fn element_index_uses_half_open_ranges() {
        let mut content = GapContent::new();
        content.insert_string(0, "abcdefghi").unwrap();
        let para = paragraph_of(&mut content, &[0, 3, 7, 10]);
        assert_eq!(para.element_index(0), 0);
        assert_eq!(para.element_index(2), 0);
        assert_eq!(para.element_index(3), 1);
        assert_eq!(para.element_index(6), 1);
        assert_eq!(para.element_index(7), 2);
        assert_eq!(para.element_index(10), 2);
        assert_eq!(para.element_index(99), 2);
    }

    #[test]
    fn leaf_bounds_follow_content_edits() {
        let mut content = GapContent::new();
        content.insert_string(0, "abcdef").unwrap();
        let para = paragraph_of(&mut content, &[0, 3, 7]);
        content.insert_string(1, "XY").unwrap();
        assert_eq!(para.child(0).unwrap().range(), 0..5);
        assert_eq!(para.child(1).unwrap().range(), 5..9);
    }

    #[test]
    fn name_attribute_overrides_default() {
        let branch = Element::new_branch(None, names::PARAGRAPH, AttributeSet::empty());
        assert_eq!(branch.name(), "paragraph");
        branch.set_attributes(AttributeSet::builder().with(keys::NAME, "heading").build());
        assert_eq!(branch.name(), "heading");
        assert_eq!(branch.range(), 0..0);
    }

    #[test]
    fn dump_is_indented() {
        let mut content = GapContent::new();
        content.insert_string(0, "ab").unwrap();
        let para = paragraph_of(&mut content, &[0, 3]);
        assert_eq!(para.dump(), "paragraph [0,3)\n  content [0,3)\n");
    }

    #[test]
    fn children_match_checks_identity() {
        let mut content = GapContent::new();
        content.insert_string(0, "abcd").unwrap();
        let para = paragraph_of(&mut content, &[0, 2, 5]);
        let kids = para.children();
        assert!(para.children_match(0, &kids));
        assert!(para.children_match(1, &kids[1..]));
        assert!(!para.children_match(1, &kids[..1]));
        assert!(!para.children_match(2, &kids[..1]));
    }
}
