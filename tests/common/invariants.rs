//! Structural checks shared by the integration tests.

use docmodel::{Document, Element};

/// Every branch's children tile its range with no gaps or overlaps.
pub fn assert_contiguous(element: &Element) {
    if element.is_leaf() {
        assert!(
            element.start_offset() <= element.end_offset(),
            "inverted leaf {:?}",
            element.range()
        );
        return;
    }
    let children = element.children();
    assert!(!children.is_empty(), "empty branch {}", element.name());
    assert_eq!(element.start_offset(), children[0].start_offset());
    assert_eq!(element.end_offset(), children[children.len() - 1].end_offset());
    for pair in children.windows(2) {
        assert_eq!(
            pair[0].end_offset(),
            pair[1].start_offset(),
            "gap between siblings in\n{}",
            element.dump()
        );
    }
    for child in &children {
        assert_contiguous(child);
    }
}

/// No two neighbouring bidi runs share a level.
pub fn assert_bidi_adjacency(document: &Document) {
    let runs = document.bidi_root_element().children();
    for pair in runs.windows(2) {
        assert_ne!(
            pair[0].attributes().bidi_level(),
            pair[1].attributes().bidi_level(),
            "adjacent runs share a level:\n{}",
            document.bidi_root_element().dump()
        );
    }
}

/// Both trees span the whole document including the implicit line break.
pub fn assert_consistent(document: &Document) {
    let end = document.len() + 1;
    let root = document.root_element();
    assert_eq!(root.range(), 0..end, "paragraph tree\n{}", root.dump());
    assert_contiguous(&root);
    let bidi = document.bidi_root_element();
    assert_eq!(bidi.range(), 0..end, "bidi tree\n{}", bidi.dump());
    assert_contiguous(&bidi);
    assert_bidi_adjacency(document);
    for paragraph in root.children() {
        let text = document
            .text(paragraph.start_offset(), paragraph.end_offset() - paragraph.start_offset())
            .unwrap();
        assert!(text.ends_with('\n'), "paragraph {:?} does not end a line", paragraph.range());
        assert_eq!(text.matches('\n').count(), 1, "paragraph {:?} holds a line break", paragraph.range());
    }
}
