//! Undo records for structural and attribute changes.

use super::Element;
use crate::attributes::AttributeSet;
use crate::event::structural_fault;

/// One branch's child splice: `removed` were replaced by `added` at `index`.
#[derive(Clone, Debug)]
pub struct ElementEdit {
    element: Element,
    index: usize,
    removed: Vec<Element>,
    added: Vec<Element>,
}

impl ElementEdit {
    pub(crate) fn new(element: Element, index: usize, removed: Vec<Element>, added: Vec<Element>) -> Self {
        Self {
            element,
            index,
            removed,
            added,
        }
    }

    /// The branch whose children changed.
    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Index of the first changed child.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn children_removed(&self) -> &[Element] {
        &self.removed
    }

    #[must_use]
    pub fn children_added(&self) -> &[Element] {
        &self.added
    }

    /// The same splice seen from the other direction.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self::new(
            self.element.clone(),
            self.index,
            self.added.clone(),
            self.removed.clone(),
        )
    }

    pub(crate) fn undo(&self) {
        Self::splice(&self.element, self.index, &self.added, &self.removed);
    }

    pub(crate) fn redo(&self) {
        Self::splice(&self.element, self.index, &self.removed, &self.added);
    }

    fn splice(element: &Element, index: usize, expected: &[Element], replacement: &[Element]) {
        if !element.children_match(index, expected) {
            structural_fault(&format!(
                "children of {element} at {index} no longer match the recorded edit"
            ));
        }
        element.replace(index, expected.len(), replacement.to_vec());
    }
}

/// An element's attributes before and after a change.
#[derive(Clone, Debug)]
pub struct AttributeEdit {
    element: Element,
    before: AttributeSet,
    after: AttributeSet,
}

impl AttributeEdit {
    pub(crate) fn new(element: Element, before: AttributeSet, after: AttributeSet) -> Self {
        Self {
            element,
            before,
            after,
        }
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        &self.element
    }

    #[must_use]
    pub fn before(&self) -> &AttributeSet {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &AttributeSet {
        &self.after
    }

    pub(crate) fn undo(&self) {
        self.element.set_attributes(self.before.clone());
    }

    pub(crate) fn redo(&self) {
        self.element.set_attributes(self.after.clone());
    }
}
