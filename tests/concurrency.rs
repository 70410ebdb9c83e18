//! Readers and writers on several threads.

mod common;

use common::invariants::assert_consistent;
use docmodel::{Document, DocumentEvent, Error, ListenerError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn parallel_writers_serialize() {
    let doc = Document::new();
    let threads = 4;
    let per_thread = 50;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let doc = doc.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let text = if i % 10 == 9 { "\n".to_string() } else { t.to_string() };
                    doc.insert_string(doc.len() / 2, &text, None).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(doc.len(), threads * per_thread);
    assert_eq!(doc.root_element().element_count(), threads * per_thread / 10 + 1);
    assert_consistent(&doc);
}

#[test]
fn readers_see_whole_transactions() {
    let doc = Document::new();
    let done = Arc::new(AtomicBool::new(false));
    let torn = Arc::new(AtomicUsize::new(0));

    let reader = {
        let doc = doc.clone();
        let done = Arc::clone(&done);
        let torn = Arc::clone(&torn);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                doc.render(|d| {
                    // text and tree are read under one lock, so they agree
                    if d.root_element().end_offset() != d.len() + 1 {
                        torn.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        })
    };

    for i in 0..200 {
        let at = doc.len();
        if i % 3 == 2 {
            doc.remove(at - 1, 1).unwrap();
        } else {
            doc.insert_string(at, "ab\n", None).unwrap();
        }
    }
    done.store(true, Ordering::SeqCst);
    reader.join().unwrap();
    assert_eq!(torn.load(Ordering::SeqCst), 0);
}

#[test]
fn slow_listener_blocks_other_writers_not_itself() {
    let doc = Document::new();
    let entered = Arc::new(Barrier::new(2));
    let first = Arc::new(AtomicBool::new(true));
    {
        let entered = Arc::clone(&entered);
        let first = Arc::clone(&first);
        doc.add_document_listener(Arc::new(move |_: &DocumentEvent| -> Result<(), ListenerError> {
            if first.swap(false, Ordering::SeqCst) {
                entered.wait();
                thread::sleep(Duration::from_millis(50));
            }
            Ok(())
        }));
    }

    let writer = {
        let doc = doc.clone();
        thread::spawn(move || doc.insert_string(0, "first", None))
    };
    entered.wait();
    // blocks until the first transaction, listener included, has finished
    doc.insert_string(0, "second ", None).unwrap();
    writer.join().unwrap().unwrap();
    assert_eq!(doc.contents(), "second first");
}

#[test]
fn reader_cannot_upgrade() {
    let doc = Document::new();
    let result = doc.render(|d| d.insert_string(0, "x", None));
    assert!(matches!(result, Err(Error::ConcurrentModification(_))));
    assert!(doc.is_empty());
}
