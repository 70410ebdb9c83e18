//! Change events and their undo records.
//!
//! One [`DocumentEvent`] is produced per transaction. It is delivered to
//! document listeners as a description of what changed, and to undoable-edit
//! listeners as the unit that undoes and redoes the whole transaction.

use super::DocumentInner;
use super::Document;
use crate::content::{ContentEdit, GapContent};
use crate::element::{AttributeEdit, Element, ElementEdit};
use crate::error::{Error, Result};
use crate::event::structural_fault;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// What a transaction did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Insert,
    Remove,
    /// Attributes changed; the text did not.
    Change,
}

impl EventKind {
    /// The kind that reverses this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Insert => Self::Remove,
            Self::Remove => Self::Insert,
            Self::Change => Self::Change,
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn presentation_name(self) -> &'static str {
        match self {
            Self::Insert => "addition",
            Self::Remove => "deletion",
            Self::Change => "style change",
        }
    }
}

#[derive(Debug)]
pub(crate) enum UndoRecord {
    Content(ContentEdit),
    Element(ElementEdit),
    Attribute(AttributeEdit),
}

impl UndoRecord {
    fn undo(&mut self, content: &mut GapContent) -> Result<()> {
        match self {
            Self::Content(edit) => edit.undo(content),
            Self::Element(edit) => {
                edit.undo();
                Ok(())
            }
            Self::Attribute(edit) => {
                edit.undo();
                Ok(())
            }
        }
    }

    fn redo(&mut self, content: &mut GapContent) -> Result<()> {
        match self {
            Self::Content(edit) => edit.redo(content),
            Self::Element(edit) => {
                edit.redo();
                Ok(())
            }
            Self::Attribute(edit) => {
                edit.redo();
                Ok(())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UndoState {
    InProgress,
    Done,
    Undone,
}

#[derive(Debug)]
struct Records {
    edits: Vec<UndoRecord>,
    state: UndoState,
    /// Element -> index into `edits`, built once there are enough element edits.
    by_element: Option<HashMap<Element, usize>>,
}

struct EventInner {
    kind: EventKind,
    offset: usize,
    length: usize,
    lookup_threshold: usize,
    document: Weak<DocumentInner>,
    records: Mutex<Records>,
}

/// One committed transaction.
///
/// Cloning is cheap; clones share the same undo state. Events delivered
/// after an undo are inverted views: their kind is reversed and each element
/// change has its added and removed children swapped.
#[derive(Clone)]
pub struct DocumentEvent {
    inner: Arc<EventInner>,
    inverted: bool,
}

impl DocumentEvent {
    pub(crate) fn new(
        document: &Arc<DocumentInner>,
        kind: EventKind,
        offset: usize,
        length: usize,
        lookup_threshold: usize,
    ) -> Self {
        Self {
            inner: Arc::new(EventInner {
                kind,
                offset,
                length,
                lookup_threshold,
                document: Arc::downgrade(document),
                records: Mutex::new(Records {
                    edits: Vec::new(),
                    state: UndoState::InProgress,
                    by_element: None,
                }),
            }),
            inverted: false,
        }
    }

    fn records(&self) -> MutexGuard<'_, Records> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, record: UndoRecord) {
        let mut records = self.records();
        records.by_element = None;
        records.edits.push(record);
    }

    pub(crate) fn push_element_edits(&self, edits: Vec<ElementEdit>) {
        for edit in edits {
            self.push(UndoRecord::Element(edit));
        }
    }

    /// Reverse what a transaction recorded before it failed part way.
    pub(crate) fn abort(&self, content: &mut GapContent) {
        let mut records = self.records();
        for record in records.edits.iter_mut().rev() {
            if let Err(e) = record.undo(content) {
                structural_fault(&format!("rolling back a failed edit: {e}"));
            }
        }
        records.edits.clear();
        records.by_element = None;
    }

    /// Freeze the record list; the event becomes undoable.
    pub(crate) fn end(&self) {
        self.records().state = UndoState::Done;
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        if self.inverted {
            self.inner.kind.inverse()
        } else {
            self.inner.kind
        }
    }

    /// First offset touched.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.inner.offset
    }

    /// Chars inserted, removed or restyled.
    #[must_use]
    pub fn length(&self) -> usize {
        self.inner.length
    }

    #[must_use]
    pub fn presentation_name(&self) -> &'static str {
        self.kind().presentation_name()
    }

    /// True if this is the view delivered after an undo.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// The document the event came from, if it is still alive.
    #[must_use]
    pub fn document(&self) -> Option<Document> {
        self.inner.document.upgrade().map(Document::from_inner)
    }

    /// The child change recorded for `element`, if any.
    ///
    /// When several edits touch the same element, the first one recorded is
    /// returned.
    #[must_use]
    pub fn change(&self, element: &Element) -> Option<ElementEdit> {
        let mut records = self.records();
        let element_edits = records
            .edits
            .iter()
            .filter(|r| matches!(r, UndoRecord::Element(_)))
            .count();

        let found = if element_edits > self.inner.lookup_threshold {
            if records.by_element.is_none() {
                let mut map = HashMap::with_capacity(element_edits);
                for (i, record) in records.edits.iter().enumerate() {
                    if let UndoRecord::Element(edit) = record {
                        map.entry(edit.element().clone()).or_insert(i);
                    }
                }
                records.by_element = Some(map);
            }
            records
                .by_element
                .as_ref()
                .and_then(|map| map.get(element))
                .and_then(|&i| match &records.edits[i] {
                    UndoRecord::Element(edit) => Some(edit.clone()),
                    _ => None,
                })
        } else {
            records.edits.iter().find_map(|record| match record {
                UndoRecord::Element(edit) if edit.element() == element => Some(edit.clone()),
                _ => None,
            })
        };
        found.map(|edit| self.orient(edit))
    }

    /// Every child change, in the order recorded.
    #[must_use]
    pub fn element_changes(&self) -> Vec<ElementEdit> {
        self.records()
            .edits
            .iter()
            .filter_map(|record| match record {
                UndoRecord::Element(edit) => Some(self.orient(edit.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every attribute change, in the order recorded.
    #[must_use]
    pub fn attribute_changes(&self) -> Vec<AttributeEdit> {
        self.records()
            .edits
            .iter()
            .filter_map(|record| match record {
                UndoRecord::Attribute(edit) => Some(edit.clone()),
                _ => None,
            })
            .collect()
    }

    /// The first text change, if the transaction touched text.
    #[must_use]
    pub fn content_change(&self) -> Option<ContentEdit> {
        self.records().edits.iter().find_map(|record| match record {
            UndoRecord::Content(edit) => Some(edit.clone()),
            _ => None,
        })
    }

    /// Every text change, in the order recorded. A replace holds its
    /// removal followed by its insertion.
    #[must_use]
    pub fn content_changes(&self) -> Vec<ContentEdit> {
        self.records()
            .edits
            .iter()
            .filter_map(|record| match record {
                UndoRecord::Content(edit) => Some(edit.clone()),
                _ => None,
            })
            .collect()
    }

    fn orient(&self, edit: ElementEdit) -> ElementEdit {
        if self.inverted { edit.inverted() } else { edit }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.records().state == UndoState::Done && self.inner.document.strong_count() > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.records().state == UndoState::Undone && self.inner.document.strong_count() > 0
    }

    /// Reverse every record of the transaction and notify document listeners
    /// with the inverted event.
    pub fn undo(&self) -> Result<()> {
        self.replay(UndoState::Done, UndoState::Undone, Error::CannotUndo)
    }

    /// Reapply a transaction previously undone.
    pub fn redo(&self) -> Result<()> {
        self.replay(UndoState::Undone, UndoState::Done, Error::CannotRedo)
    }

    fn replay(&self, from: UndoState, to: UndoState, refused: Error) -> Result<()> {
        let Some(document) = self.inner.document.upgrade() else {
            return Err(refused);
        };
        let _write = document.lock.write()?;
        {
            let mut records = self.records();
            if records.state != from {
                return Err(refused);
            }
            let mut content = document.content();
            if to == UndoState::Undone {
                for record in records.edits.iter_mut().rev() {
                    record.undo(&mut content)?;
                }
            } else {
                for record in &mut records.edits {
                    record.redo(&mut content)?;
                }
            }
            records.state = to;
        }
        let view = Self {
            inner: Arc::clone(&self.inner),
            inverted: to == UndoState::Undone,
        };
        document.fire_document_listeners(&view)
    }
}

impl fmt::Debug for DocumentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.records();
        f.debug_struct("DocumentEvent")
            .field("kind", &self.kind())
            .field("offset", &self.inner.offset)
            .field("length", &self.inner.length)
            .field("edits", &records.edits.len())
            .field("state", &records.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentConfig, DocumentListener};
    use crate::error::ListenerError;

    fn same_splice(a: &ElementEdit, b: &ElementEdit) -> bool {
        let same = |x: &[Element], y: &[Element]| x.len() == y.len() && x.iter().zip(y).all(|(p, q)| p.ptr_eq(q));
        a.element().ptr_eq(b.element())
            && a.index() == b.index()
            && same(a.children_added(), b.children_added())
            && same(a.children_removed(), b.children_removed())
    }

    fn first_for<'a>(edits: &'a [ElementEdit], element: &Element) -> &'a ElementEdit {
        edits.iter().find(|e| e.element() == element).unwrap()
    }

    #[test]
    fn indexed_lookup_matches_the_linear_scan() {
        let doc = Document::with_config(DocumentConfig::default().with_edit_lookup_threshold(0));
        doc.insert_string(0, "one\ntwo", None).unwrap();
        let event = doc.insert_string(4, "x\ny\nz\n", None).unwrap().unwrap();

        let edits = event.element_changes();
        assert!(!edits.is_empty());
        for edit in &edits {
            let found = event.change(edit.element()).unwrap();
            assert!(same_splice(&found, first_for(&edits, edit.element())));
        }
        assert!(event.change(&doc.character_element(0)).is_none());
    }

    #[test]
    fn indexed_lookup_on_the_undo_view_is_inverted() {
        let doc = Document::with_config(DocumentConfig::default().with_edit_lookup_threshold(0));
        doc.insert_string(0, "one\ntwo", None).unwrap();
        let event = doc.insert_string(4, "x\ny\n", None).unwrap().unwrap();
        let forward = event.element_changes();

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let listener: Arc<dyn DocumentListener> = Arc::new(move |e: &DocumentEvent| -> std::result::Result<(), ListenerError> {
            *sink.lock().unwrap() = Some(e.clone());
            Ok(())
        });
        doc.add_document_listener(listener);
        event.undo().unwrap();

        let view = seen.lock().unwrap().take().unwrap();
        assert!(view.is_inverted());
        assert_eq!(view.kind(), EventKind::Remove);
        for edit in &forward {
            let found = view.change(edit.element()).unwrap();
            assert!(same_splice(&found, &first_for(&forward, edit.element()).inverted()));
        }
    }

    #[test]
    fn undo_and_redo_follow_the_state() {
        let doc = Document::new();
        let event = doc.insert_string(0, "abc", None).unwrap().unwrap();
        assert!(event.can_undo());
        assert!(matches!(event.redo(), Err(Error::CannotRedo)));
        event.undo().unwrap();
        assert!(doc.is_empty());
        assert!(matches!(event.undo(), Err(Error::CannotUndo)));
        event.redo().unwrap();
        assert_eq!(doc.contents(), "abc");
    }
}
