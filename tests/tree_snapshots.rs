//! Snapshot tests of element tree dumps after typical edits.

use docmodel::{AttributeSet, Document, keys};

fn bold() -> AttributeSet {
    AttributeSet::builder().with(keys::BOLD, true).build()
}

#[test]
fn empty_document() {
    let doc = Document::new();
    insta::assert_snapshot!(doc.root_element().dump(), @r"
    section [0,1)
      paragraph [0,1)
        content [0,1)
    ");
}

#[test]
fn three_paragraphs() {
    let doc = Document::new();
    doc.insert_string(0, "one\ntwo\nthree", None).unwrap();
    insta::assert_snapshot!(doc.root_element().dump(), @r"
    section [0,14)
      paragraph [0,4)
        content [0,4)
      paragraph [4,8)
        content [4,8)
      paragraph [8,14)
        content [8,14)
    ");
}

#[test]
fn bold_word_in_a_line() {
    let doc = Document::new();
    doc.insert_string(0, "a  c", None).unwrap();
    doc.insert_string(2, "b", Some(&bold())).unwrap();
    insta::assert_snapshot!(doc.root_element().dump(), @r"
    section [0,6)
      paragraph [0,6)
        content [0,2)
        content [2,3) {bold=true}
        content [3,6)
    ");
}

#[test]
fn mixed_direction_runs() {
    let doc = Document::new();
    doc.insert_string(0, "abc שלום", None).unwrap();
    insta::assert_snapshot!(doc.bidi_root_element().dump(), @r"
    bidi root [0,9)
      bidi level [0,4) {bidi_level=0}
      bidi level [4,8) {bidi_level=1}
      bidi level [8,9) {bidi_level=0}
    ");
}
