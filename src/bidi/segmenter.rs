//! Keeps the bidi tree in step with the paragraph tree.

use super::{BidiAnalyzer, Direction};
use crate::attributes::{AttributeContext, AttributeSet, keys};
use crate::content::GapContent;
use crate::element::{Element, ElementEdit, names};
use crate::event::structural_fault;
use std::ops::Range;

/// Re-analyses whole paragraphs and splices the resulting level runs into
/// the bidi root, merging with equal-level neighbours on either side.
pub(crate) struct BidiSegmenter<'a> {
    pub(crate) bidi_root: &'a Element,
    pub(crate) paragraphs: &'a Element,
    pub(crate) content: &'a mut GapContent,
    pub(crate) context: &'a AttributeContext,
    pub(crate) analyzer: &'a dyn BidiAnalyzer,
    pub(crate) default_direction: Option<Direction>,
}

impl BidiSegmenter<'_> {
    /// Paragraph-aligned span covering `[offset, offset + length]`.
    pub(crate) fn affected(&self, offset: usize, length: usize) -> Range<usize> {
        let first = self.paragraph(offset).start_offset();
        let last = self.paragraph(offset + length).end_offset();
        first..last
    }

    /// Resegment the paragraphs spanning `range` (paragraph-aligned).
    pub(crate) fn update(mut self, range: Range<usize>) -> ElementEdit {
        let levels = self.levels(range.clone());
        let Some((&first_level, &last_level)) = levels.first().zip(levels.last()) else {
            structural_fault("bidi update over an empty range");
        };
        let first_p_start = range.start;
        let last_p_end = range.end;
        let root = self.bidi_root;
        let doc_len = self.content.len() - 1;
        let mut added = Vec::new();

        // merge into or truncate the run before the span
        let mut first_span_start = first_p_start;
        let mut remove_from = 0;
        if first_span_start > 0 {
            let prev_index = root.element_index(first_p_start - 1);
            remove_from = prev_index;
            let prev = Self::run_at(root, prev_index);
            let prev_level = prev.attributes().bidi_level();
            if prev_level == first_level {
                first_span_start = prev.start_offset();
            } else if prev.end_offset() > first_p_start {
                added.push(self.run(prev.start_offset(), first_p_start, prev_level));
            } else {
                remove_from += 1;
            }
        }
        let first_span_end = levels.iter().take_while(|&&l| l == first_level).count();

        // and symmetrically after it
        let mut last_span_end = last_p_end;
        let mut next_run = None;
        let mut remove_to = root.element_count().saturating_sub(1) as isize;
        if last_span_end <= doc_len {
            let next_index = root.element_index(last_p_end);
            remove_to = next_index as isize;
            let next = Self::run_at(root, next_index);
            let next_level = next.attributes().bidi_level();
            if next_level == last_level {
                last_span_end = next.end_offset();
            } else if next.start_offset() < last_p_end {
                next_run = Some((last_p_end, next.end_offset(), next_level));
            } else {
                remove_to -= 1;
            }
        }
        let mut last_span_start = levels.len();
        while last_span_start > first_span_end && levels[last_span_start - 1] == last_level {
            last_span_start -= 1;
        }

        if first_span_end == last_span_start && first_level == last_level {
            added.push(self.run(first_span_start, last_span_end, first_level));
        } else {
            added.push(self.run(first_span_start, first_p_start + first_span_end, first_level));
            let mut i = first_span_end;
            while i < last_span_start {
                let level = levels[i];
                let j = i + levels[i..].iter().take_while(|&&l| l == level).count();
                added.push(self.run(first_p_start + i, first_p_start + j, level));
                i = j;
            }
            added.push(self.run(first_p_start + last_span_start, last_span_end, last_level));
        }
        if let Some((start, end, level)) = next_run {
            added.push(self.run(start, end, level));
        }

        let removed_count = if root.element_count() > 0 {
            usize::try_from(remove_to - remove_from as isize + 1).unwrap_or(0)
        } else {
            0
        };
        let removed: Vec<Element> = (remove_from..remove_from + removed_count)
            .map(|i| Self::run_at(root, i))
            .collect();
        root.replace(remove_from, removed.len(), added.clone());
        ElementEdit::new(root.clone(), remove_from, removed, added)
    }

    /// One level per char of `range`, paragraph by paragraph.
    fn levels(&self, range: Range<usize>) -> Vec<u8> {
        let mut levels = Vec::with_capacity(range.len());
        let mut offset = range.start;
        while offset < range.end {
            let paragraph = self.paragraph(offset);
            let (start, end) = (paragraph.start_offset(), paragraph.end_offset());
            let direction = paragraph
                .attributes()
                .run_direction()
                .or(self.default_direction);
            let text = self
                .content
                .text(start, end - start)
                .unwrap_or_else(|e| structural_fault(&format!("paragraph text {start}..{end}: {e}")));
            let mut paragraph_levels = self.analyzer.levels(&text, direction);
            // a short or long answer from a custom analyzer must not shift later paragraphs
            let base = direction.map_or(0, Direction::base_level);
            paragraph_levels.resize(end - start, base);
            levels.extend(paragraph_levels);
            offset = end;
        }
        levels
    }

    fn paragraph(&self, offset: usize) -> Element {
        self.paragraphs
            .paragraph_at(offset)
            .unwrap_or_else(|| structural_fault(&format!("no paragraph at {offset}")))
    }

    fn run_at(root: &Element, index: usize) -> Element {
        root.child(index)
            .unwrap_or_else(|| structural_fault(&format!("no bidi run at {index}")))
    }

    fn run(&mut self, start: usize, end: usize, level: u8) -> Element {
        let attributes = AttributeSet::builder()
            .with(keys::BIDI_LEVEL, i64::from(level))
            .build();
        let (start, end) = match (self.content.create_position(start), self.content.create_position(end)) {
            (Ok(start), Ok(end)) => (start, end),
            (Err(e), _) | (_, Err(e)) => structural_fault(&format!("bidi run bounds: {e}")),
        };
        Element::new_leaf(
            Some(self.bidi_root),
            names::BIDI_LEVEL,
            self.context.canonical(&attributes),
            start,
            end,
        )
    }
}

/// Fresh bidi root with one level-0 run over `[0, end)`.
pub(crate) fn initial_root(content: &mut GapContent, context: &AttributeContext, end: usize) -> Element {
    let root = Element::new_branch(None, names::BIDI_ROOT, AttributeSet::empty());
    let attributes = AttributeSet::builder()
        .with(keys::BIDI_LEVEL, 0_i64)
        .build();
    let (start, end) = match (content.create_position(0), content.create_position(end)) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(e), _) | (_, Err(e)) => structural_fault(&format!("initial bidi run: {e}")),
    };
    let run = Element::new_leaf(
        Some(&root),
        names::BIDI_LEVEL,
        context.canonical(&attributes),
        start,
        end,
    );
    root.replace(0, 0, vec![run]);
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::UnicodeBidiAnalyzer;

    /// Paragraph tree with one paragraph per `\n`-terminated line of `text`.
    fn paragraphs(content: &mut GapContent, text: &str) -> Element {
        content.insert_string(0, text).unwrap();
        let root = Element::new_branch(None, names::SECTION, AttributeSet::empty());
        let all: Vec<char> = content.text(0, content.len()).unwrap().chars().collect();
        let mut start = 0;
        let mut paras = Vec::new();
        for (i, ch) in all.iter().enumerate() {
            if *ch == '\n' {
                let para = Element::new_branch(Some(&root), names::PARAGRAPH, AttributeSet::empty());
                let leaf = Element::new_leaf(
                    Some(&para),
                    names::CONTENT,
                    AttributeSet::empty(),
                    content.create_position(start).unwrap(),
                    content.create_position(i + 1).unwrap(),
                );
                para.replace(0, 0, vec![leaf]);
                paras.push(para);
                start = i + 1;
            }
        }
        root.replace(0, 0, paras);
        root
    }

    fn levels_of(root: &Element) -> Vec<(u8, Range<usize>)> {
        root.children()
            .iter()
            .map(|run| (run.attributes().bidi_level(), run.range()))
            .collect()
    }

    fn resegment(text: &str) -> Element {
        let mut content = GapContent::new();
        let context = AttributeContext::new();
        let paras = paragraphs(&mut content, text);
        let end = content.len();
        let bidi_root = initial_root(&mut content, &context, end);
        let segmenter = BidiSegmenter {
            bidi_root: &bidi_root,
            paragraphs: &paras,
            content: &mut content,
            context: &context,
            analyzer: &UnicodeBidiAnalyzer,
            default_direction: None,
        };
        let range = segmenter.affected(0, end - 1);
        let edit = segmenter.update(range);
        assert_eq!(edit.element(), &bidi_root);
        bidi_root
    }

    #[test]
    fn ltr_document_keeps_one_run() {
        let root = resegment("hello\nworld");
        assert_eq!(levels_of(&root), vec![(0, 0..12)]);
    }

    #[test]
    fn rtl_word_gets_its_own_run() {
        let root = resegment("ab שלום cd");
        let runs = levels_of(&root);
        assert_eq!(runs.first().map(|r| r.0), Some(0));
        assert!(runs.iter().any(|r| r.0 == 1));
        assert_eq!(runs.last().map(|r| r.1.end), Some(11));
    }

    #[test]
    fn adjacent_runs_never_share_a_level() {
        let root = resegment("abc\nשלום\nעולם\ndef");
        let runs = levels_of(&root);
        for pair in runs.windows(2) {
            assert_ne!(pair[0].0, pair[1].0);
            assert_eq!(pair[0].1.end, pair[1].1.start);
        }
        assert_eq!(runs.first().map(|r| r.1.start), Some(0));
    }
}
