//! Document editing benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use docmodel::layout::FlowLayout;
use docmodel::{AttributeSet, Document, UndoLog, keys};
use std::hint::black_box;

fn prose(paragraphs: usize) -> String {
    vec!["The quick brown fox jumps over the lazy dog. ".repeat(4); paragraphs].join("\n")
}

fn typing(c: &mut Criterion) {
    c.bench_function("type_1k_chars_at_cursor", |b| {
        b.iter_batched(
            Document::new,
            |doc| {
                for i in 0..1_000 {
                    doc.insert_string(black_box(i), "x", None).unwrap();
                }
                doc
            },
            BatchSize::SmallInput,
        );
    });

    let text = prose(200);
    c.bench_function("type_into_middle_of_200_paragraphs", |b| {
        b.iter_batched(
            || {
                let doc = Document::new();
                doc.insert_string(0, &text, None).unwrap();
                doc
            },
            |doc| {
                let mid = doc.len() / 2;
                for i in 0..100 {
                    doc.insert_string(black_box(mid + i), "y", None).unwrap();
                }
                doc
            },
            BatchSize::SmallInput,
        );
    });
}

fn paragraph_splitting(c: &mut Criterion) {
    let text = prose(50);
    c.bench_function("split_50_paragraphs", |b| {
        b.iter_batched(
            || {
                let doc = Document::new();
                doc.insert_string(0, &text, None).unwrap();
                doc
            },
            |doc| {
                let starts: Vec<_> = doc
                    .root_element()
                    .children()
                    .iter()
                    .map(|p| p.start_offset() + 10)
                    .collect();
                for at in starts.into_iter().rev() {
                    doc.insert_string(at, "\n", None).unwrap();
                }
                doc
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("join_all_paragraphs", |b| {
        b.iter_batched(
            || {
                let doc = Document::new();
                doc.insert_string(0, &text, None).unwrap();
                doc
            },
            |doc| {
                while doc.root_element().element_count() > 1 {
                    let first = doc.root_element().child(0).unwrap();
                    doc.remove(first.end_offset() - 1, 1).unwrap();
                }
                doc
            },
            BatchSize::SmallInput,
        );
    });
}

fn styling_and_undo(c: &mut Criterion) {
    let text = prose(20);
    let bold = AttributeSet::builder().with(keys::BOLD, true).build();
    c.bench_function("style_every_other_word_then_undo", |b| {
        b.iter_batched(
            || {
                let doc = Document::new();
                doc.insert_string(0, &text, None).unwrap();
                let log = UndoLog::attach(&doc);
                (doc, log)
            },
            |(doc, log)| {
                let len = doc.len();
                let mut at = 0;
                while at + 4 < len {
                    doc.set_character_attributes(at, 3, &bold, false).unwrap();
                    at += 8;
                }
                while log.undo().unwrap() {}
                doc
            },
            BatchSize::SmallInput,
        );
    });
}

fn bidi_and_layout(c: &mut Criterion) {
    let mixed = "abc שלום def עולם ghi\n".repeat(50);
    c.bench_function("insert_mixed_direction_text", |b| {
        b.iter(|| {
            let doc = Document::new();
            doc.insert_string(0, black_box(&mixed), None).unwrap();
            doc
        });
    });

    let doc = Document::new();
    doc.insert_string(0, &prose(100), None).unwrap();
    c.bench_function("flow_layout_100_paragraphs", |b| {
        b.iter(|| {
            let mut layout = FlowLayout::new().wrap_width(black_box(40));
            layout.layout(&doc);
            layout
        });
    });
}

criterion_group!(
    benches,
    typing,
    paragraph_splitting,
    styling_and_undo,
    bidi_and_layout
);
criterion_main!(benches);
