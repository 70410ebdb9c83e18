//! Fuzz target for document editing.
//!
//! Replays arbitrary edit scripts, including undo and redo, and checks that
//! the text and both element trees stay consistent.

#![no_main]

use arbitrary::Arbitrary;
use docmodel::{AttributeSet, Document, UndoLog, keys};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { at: u16, text: String, bold: bool },
    Remove { at: u16, len: u8 },
    Style { at: u16, len: u8, replace: bool },
    Paragraph { at: u16, rtl: bool },
    Undo,
    Redo,
}

fuzz_target!(|ops: Vec<Op>| {
    let doc = Document::new();
    let log = UndoLog::attach(&doc);
    let bold = AttributeSet::builder().with(keys::BOLD, true).build();

    for op in ops.iter().take(256) {
        let len = doc.len();
        match op {
            Op::Insert { at, text, bold: styled } => {
                let text: String = text.chars().take(32).collect();
                let at = usize::from(*at) % (len + 1);
                doc.insert_string(at, &text, styled.then_some(&bold)).unwrap();
            }
            Op::Remove { at, len: n } if len > 0 => {
                let at = usize::from(*at) % len;
                let n = usize::from(*n).min(len - at);
                doc.remove(at, n).unwrap();
            }
            Op::Style { at, len: n, replace } if len > 0 => {
                let at = usize::from(*at) % len;
                let n = usize::from(*n).min(len - at);
                doc.set_character_attributes(at, n, &bold, *replace).unwrap();
            }
            Op::Paragraph { at, rtl } => {
                let at = usize::from(*at) % (len + 1);
                let direction = if *rtl { docmodel::Direction::Rtl } else { docmodel::Direction::Ltr };
                let attributes = AttributeSet::builder().with(keys::RUN_DIRECTION, direction).build();
                doc.set_paragraph_attributes(at, 0, &attributes, false).unwrap();
            }
            Op::Undo => {
                log.undo().unwrap();
            }
            Op::Redo => {
                log.redo().unwrap();
            }
            Op::Remove { .. } | Op::Style { .. } => {}
        }

        let end = doc.len() + 1;
        assert_eq!(doc.root_element().range(), 0..end);
        assert_eq!(doc.bidi_root_element().range(), 0..end);
        let runs = doc.bidi_root_element().children();
        for pair in runs.windows(2) {
            assert_ne!(pair[0].attributes().bidi_level(), pair[1].attributes().bidi_level());
        }
    }
});
