//! Undo and redo of whole transactions.

mod common;

use common::invariants::assert_consistent;
use docmodel::{AttributeSet, Document, DocumentEvent, Error, EventKind, UndoLog, keys};
use std::sync::{Arc, Mutex};

/// Structural fingerprint: text plus both tree dumps.
fn snapshot(doc: &Document) -> (String, String, String) {
    (
        doc.contents(),
        doc.root_element().dump(),
        doc.bidi_root_element().dump(),
    )
}

#[test]
fn undo_then_redo_restores_each_state() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    let bold = AttributeSet::builder().with(keys::BOLD, true).build();

    let mut states = vec![snapshot(&doc)];
    doc.insert_string(0, "alpha beta\ngamma", None).unwrap();
    states.push(snapshot(&doc));
    doc.insert_string(6, "X\nY", Some(&bold)).unwrap();
    states.push(snapshot(&doc));
    doc.remove(3, 6).unwrap();
    states.push(snapshot(&doc));
    doc.set_character_attributes(0, 4, &bold, false).unwrap();
    states.push(snapshot(&doc));

    for expected in states.iter().rev().skip(1) {
        assert!(log.undo().unwrap());
        assert_eq!(&snapshot(&doc), expected);
        assert_consistent(&doc);
    }
    assert!(!log.can_undo());

    for expected in states.iter().skip(1) {
        assert!(log.redo().unwrap());
        assert_eq!(&snapshot(&doc), expected);
        assert_consistent(&doc);
    }
}

#[test]
fn positions_inside_a_removed_range_come_back() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    doc.insert_string(0, "0123456789", None).unwrap();
    let inside = doc.create_position(5).unwrap();
    doc.remove(2, 6).unwrap();
    assert_eq!(inside.offset(), 2);
    log.undo().unwrap();
    assert_eq!(inside.offset(), 5);
}

#[test]
fn event_cannot_be_undone_twice() {
    let doc = Document::new();
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    doc.add_undoable_edit_listener(Arc::new(Capture(sink)));
    doc.insert_string(0, "abc", None).unwrap();

    let event = captured.lock().unwrap().take().unwrap();
    assert!(event.can_undo());
    assert!(!event.can_redo());
    event.undo().unwrap();
    assert!(matches!(event.undo(), Err(Error::CannotUndo)));
    assert!(event.can_redo());
    event.redo().unwrap();
    assert!(matches!(event.redo(), Err(Error::CannotRedo)));
    assert_eq!(doc.contents(), "abc");
}

struct Capture(Arc<Mutex<Option<DocumentEvent>>>);

impl docmodel::UndoableEditListener for Capture {
    fn undoable_edit_happened(&self, edit: &DocumentEvent) -> Result<(), docmodel::ListenerError> {
        *self.0.lock().unwrap() = Some(edit.clone());
        Ok(())
    }
}

#[test]
fn undo_notifies_with_the_inverse_event() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    doc.insert_string(0, "ab\ncd", None).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let root = doc.root_element();
    doc.add_document_listener(Arc::new(move |e: &DocumentEvent| -> Result<(), docmodel::ListenerError> {
        let added = e.change(&root).map(|c| c.children_added().len());
        sink.lock().unwrap().push((e.kind(), e.is_inverted(), added));
        Ok(())
    }));
    log.undo().unwrap();
    log.redo().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].0, seen[0].1), (EventKind::Remove, true));
    assert_eq!((seen[1].0, seen[1].1), (EventKind::Insert, false));
    // the inverted view swaps added and removed children
    assert_ne!(seen[0].2, seen[1].2);
}

#[test]
fn undo_survives_a_failing_listener() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    doc.insert_string(0, "abc", None).unwrap();
    doc.add_document_listener(Arc::new(|_: &DocumentEvent| -> Result<(), docmodel::ListenerError> {
        Err("listener down".into())
    }));
    assert!(matches!(log.undo(), Err(Error::Listeners(_))));
    assert!(doc.is_empty());
    assert!(log.can_redo());
}

#[test]
fn undo_of_paragraph_attributes_and_logical_style() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    doc.insert_string(0, "one\ntwo", None).unwrap();
    let before = snapshot(&doc);
    let before_style = doc.logical_style(5).unwrap();

    let indent = AttributeSet::builder().with(keys::LEFT_INDENT, 2_i64).build();
    doc.set_paragraph_attributes(0, 7, &indent, false).unwrap();
    let heading = AttributeSet::builder().with(keys::FONT_SIZE, 20_i64).build();
    doc.set_logical_style(5, Some(&heading)).unwrap();
    assert_eq!(doc.logical_style(5).unwrap(), Some(heading));

    log.undo().unwrap();
    log.undo().unwrap();
    assert_eq!(snapshot(&doc), before);
    assert_eq!(doc.logical_style(5).unwrap(), before_style);
    assert!(doc.paragraph_element(0).attributes().get(&keys::LEFT_INDENT).is_none());
}

#[test]
fn replace_undoes_in_one_step() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    doc.insert_string(0, "hello world", None).unwrap();
    let before = snapshot(&doc);

    doc.replace(6, 5, "there", None).unwrap();
    assert_eq!(doc.contents(), "hello there");
    assert_eq!(log.undo_depth(), 2);

    assert!(log.undo().unwrap());
    assert_eq!(snapshot(&doc), before);
    assert_consistent(&doc);
    assert!(log.redo().unwrap());
    assert_eq!(doc.contents(), "hello there");
    assert_consistent(&doc);
}

#[test]
fn replace_across_paragraphs_undoes_in_one_step() {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    doc.insert_string(0, "first line\nsecond line", None).unwrap();
    let before = snapshot(&doc);

    doc.replace(6, 9, "\nthird\n", None).unwrap();
    assert_eq!(doc.root_element().element_count(), 3);
    assert!(log.undo().unwrap());
    assert_eq!(snapshot(&doc), before);
    assert_consistent(&doc);
}
