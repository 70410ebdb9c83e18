//! Paragraph flow: rows, and mapping between offsets and coordinates.

use super::breaker::{LineBreaker, WordBreaker};
use super::metrics::{CellMetrics, TextMetrics};
use crate::content::Bias;
use crate::document::Document;
use std::ops::Range;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Axis-aligned rectangle in layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Glyph {
    offset: usize,
    chars: usize,
    x: u32,
    width: u32,
}

/// One visual row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Index of the paragraph under the section root.
    pub paragraph: usize,
    /// Chars covered, including a trailing line break.
    pub range: Range<usize>,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// True for rows produced by wrapping rather than by a paragraph start.
    pub continuation: bool,
    glyphs: Vec<Glyph>,
}

impl Row {
    /// Bounds of the row.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, self.y, self.width, self.height)
    }

    /// x where a caret at `offset` sits. `offset` must lie in `range` or at its end.
    fn caret_x(&self, offset: usize) -> u32 {
        self.glyphs
            .iter()
            .find(|g| offset < g.offset + g.chars)
            .map_or(self.width, |g| g.x)
    }

    /// Last offset a caret may take on this row.
    fn caret_end(&self) -> usize {
        match self.glyphs.last() {
            Some(last) if self.ends_paragraph() => last.offset,
            _ => self.range.end,
        }
    }

    fn ends_paragraph(&self) -> bool {
        self.glyphs.last().is_some_and(|g| g.width == 0 && g.offset + g.chars == self.range.end)
    }
}

/// Breaks each paragraph of a document into rows of at most `wrap_width`.
///
/// Rows cover the text contiguously; whitespace that overflows the width
/// hangs at the end of its row. Runs are laid out in logical order.
pub struct FlowLayout {
    wrap_width: Option<u32>,
    metrics: Arc<dyn TextMetrics>,
    breaker: Arc<dyn LineBreaker>,
    rows: Vec<Row>,
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowLayout {
    #[must_use]
    pub fn new() -> Self {
        Self {
            wrap_width: None,
            metrics: Arc::new(CellMetrics::default()),
            breaker: Arc::new(WordBreaker),
            rows: Vec::new(),
        }
    }

    /// Wrap rows wider than `width`. Zero disables wrapping.
    #[must_use]
    pub fn wrap_width(mut self, width: u32) -> Self {
        self.wrap_width = (width > 0).then_some(width);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn breaker(mut self, breaker: Arc<dyn LineBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Recompute every row from `document`.
    pub fn layout(&mut self, document: &Document) {
        self.rows = document.render(|doc| {
            let mut rows = Vec::new();
            let mut y = 0;
            for (index, paragraph) in doc.root_element().children().iter().enumerate() {
                let start = paragraph.start_offset();
                let text = doc
                    .text(start, paragraph.end_offset() - start)
                    .unwrap_or_default();
                self.flow_paragraph(doc, index, start, &text, &mut y, &mut rows);
            }
            rows
        });
    }

    fn flow_paragraph(
        &self,
        doc: &Document,
        paragraph: usize,
        start: usize,
        text: &str,
        y: &mut u32,
        rows: &mut Vec<Row>,
    ) {
        let mut graphemes = Vec::new();
        let mut offset = start;
        for (byte, g) in text.grapheme_indices(true) {
            let chars = g.chars().count();
            graphemes.push((byte, offset, chars, g));
            offset += chars;
        }
        let opportunities = self.breaker.opportunities(text);
        let paragraph_height = self
            .metrics
            .line_height(&doc.paragraph_element(start).attributes());

        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut row_height = paragraph_height;
        let mut x = 0;
        let mut last_break: Option<usize> = None;
        let mut continuation = false;
        let mut i = 0;
        while i < graphemes.len() {
            let (byte, offset, chars, g) = graphemes[i];
            if !glyphs.is_empty() && opportunities.binary_search(&byte).is_ok() {
                last_break = Some(i);
            }
            let attributes = doc.character_element(offset).attributes();
            let width = self.metrics.width(g, &attributes, x);
            let is_ws = g.chars().all(char::is_whitespace);

            let overflows = self.wrap_width.is_some_and(|w| x + width > w);
            if overflows && x > 0 && !is_ws {
                let row_start_index = i - glyphs.len();
                let break_index = last_break.filter(|&b| b > row_start_index).unwrap_or(i);
                glyphs.truncate(break_index - row_start_index);
                Self::push_row(rows, paragraph, &mut glyphs, y, row_height, continuation);
                continuation = true;
                row_height = paragraph_height;
                x = 0;
                last_break = None;
                i = break_index;
                continue;
            }

            glyphs.push(Glyph {
                offset,
                chars,
                x,
                width,
            });
            row_height = row_height.max(self.metrics.line_height(&attributes));
            x += width;
            i += 1;
        }
        if !glyphs.is_empty() {
            Self::push_row(rows, paragraph, &mut glyphs, y, row_height, continuation);
        }
    }

    fn push_row(
        rows: &mut Vec<Row>,
        paragraph: usize,
        glyphs: &mut Vec<Glyph>,
        y: &mut u32,
        height: u32,
        continuation: bool,
    ) {
        let glyphs = std::mem::take(glyphs);
        let (Some(first), Some(last)) = (glyphs.first(), glyphs.last()) else {
            return;
        };
        let range = first.offset..last.offset + last.chars;
        let width = last.x + last.width;
        rows.push(Row {
            paragraph,
            range,
            y: *y,
            width,
            height,
            continuation,
            glyphs,
        });
        *y += height;
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Total height of all rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.rows.last().map_or(0, |r| r.y + r.height)
    }

    /// Widest row.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.rows.iter().map(|r| r.width).max().unwrap_or(0)
    }

    /// Index of the row showing a caret at `offset`.
    ///
    /// At a wrap point the offset ends one row and starts the next;
    /// `Backward` picks the earlier row, `Forward` the later one.
    #[must_use]
    pub fn row_for(&self, offset: usize, bias: Bias) -> Option<usize> {
        let index = self
            .rows
            .partition_point(|r| r.range.end <= offset)
            .min(self.rows.len().checked_sub(1)?);
        let row = &self.rows[index];
        if offset < row.range.start || offset > row.range.end {
            return None;
        }
        if bias == Bias::Backward && offset == row.range.start && row.continuation && index > 0 {
            return Some(index - 1);
        }
        Some(index)
    }

    /// Caret rectangle for `offset`: zero width at the caret's x, as high as its row.
    #[must_use]
    pub fn model_to_view(&self, offset: usize, bias: Bias) -> Option<Rect> {
        let row = &self.rows[self.row_for(offset, bias)?];
        Some(Rect::new(row.caret_x(offset), row.y, 0, row.height))
    }

    /// Offset nearest to the point `(x, y)`.
    ///
    /// Points above or below the text clamp to the first or last row. The
    /// returned bias keeps the caret on the row that was hit.
    #[must_use]
    pub fn view_to_model(&self, x: u32, y: u32) -> Option<(usize, Bias)> {
        let index = self
            .rows
            .partition_point(|r| r.y + r.height <= y)
            .min(self.rows.len().checked_sub(1)?);
        let row = &self.rows[index];
        let end = row.caret_end();
        for glyph in &row.glyphs {
            if glyph.offset >= end {
                break;
            }
            if x < glyph.x + glyph.width.div_ceil(2) {
                return Some((glyph.offset, Bias::Forward));
            }
        }
        let bias = if end == row.range.end { Bias::Backward } else { Bias::Forward };
        Some((end, bias))
    }
}

impl std::fmt::Debug for FlowLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowLayout")
            .field("wrap_width", &self.wrap_width)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CharBreaker;

    fn laid_out(text: &str, width: u32) -> (Document, FlowLayout) {
        let doc = Document::new();
        doc.insert_string(0, text, None).unwrap();
        let mut layout = FlowLayout::new().wrap_width(width);
        layout.layout(&doc);
        (doc, layout)
    }

    fn ranges(layout: &FlowLayout) -> Vec<Range<usize>> {
        layout.rows().iter().map(|r| r.range.clone()).collect()
    }

    #[test]
    fn one_row_per_paragraph_without_wrapping() {
        let (_doc, layout) = laid_out("ab\ncdef", 0);
        assert_eq!(ranges(&layout), vec![0..3, 3..8]);
        assert_eq!(layout.rows()[1].width, 4);
        assert_eq!(layout.height(), 2);
        assert_eq!(layout.width(), 4);
    }

    #[test]
    fn words_wrap_at_spaces() {
        let (_doc, layout) = laid_out("hello big world", 10);
        assert_eq!(ranges(&layout), vec![0..10, 10..16]);
        assert!(layout.rows()[1].continuation);
    }

    #[test]
    fn long_word_is_split() {
        let (_doc, layout) = laid_out("abcdefgh", 3);
        assert_eq!(ranges(&layout), vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn char_breaker_ignores_words() {
        let doc = Document::new();
        doc.insert_string(0, "ab cd", None).unwrap();
        let mut layout = FlowLayout::new()
            .wrap_width(4)
            .breaker(Arc::new(CharBreaker));
        layout.layout(&doc);
        assert_eq!(ranges(&layout), vec![0..4, 4..6]);
    }

    #[test]
    fn caret_rectangles() {
        let (_doc, layout) = laid_out("hello big world", 10);
        assert_eq!(layout.model_to_view(0, Bias::Forward), Some(Rect::new(0, 0, 0, 1)));
        assert_eq!(layout.model_to_view(7, Bias::Forward), Some(Rect::new(7, 0, 0, 1)));
        // the wrap point belongs to either row
        assert_eq!(layout.model_to_view(10, Bias::Backward), Some(Rect::new(10, 0, 0, 1)));
        assert_eq!(layout.model_to_view(10, Bias::Forward), Some(Rect::new(0, 1, 0, 1)));
        assert_eq!(layout.model_to_view(15, Bias::Forward), Some(Rect::new(5, 1, 0, 1)));
        assert_eq!(layout.model_to_view(99, Bias::Forward), None);
    }

    #[test]
    fn hit_testing() {
        let (_doc, layout) = laid_out("ab\ncd", 0);
        assert_eq!(layout.view_to_model(0, 0), Some((0, Bias::Forward)));
        assert_eq!(layout.view_to_model(1, 0), Some((1, Bias::Forward)));
        // past the end of a paragraph lands before its line break
        assert_eq!(layout.view_to_model(9, 0), Some((2, Bias::Forward)));
        assert_eq!(layout.view_to_model(1, 1), Some((4, Bias::Forward)));
        // below the text clamps to the last row
        assert_eq!(layout.view_to_model(0, 50), Some((3, Bias::Forward)));
    }

    #[test]
    fn round_trip_through_coordinates() {
        let (doc, layout) = laid_out("one two three four", 8);
        for offset in 0..=doc.len() {
            let rect = layout.model_to_view(offset, Bias::Forward).unwrap();
            let (back, _) = layout.view_to_model(rect.x, rect.y).unwrap();
            assert_eq!(back, offset, "offset {offset} via {rect:?}");
        }
    }

    #[test]
    fn empty_document_has_one_row() {
        let doc = Document::new();
        let mut layout = FlowLayout::new();
        layout.layout(&doc);
        assert_eq!(ranges(&layout), vec![0..1]);
        assert_eq!(layout.rows()[0].width, 0);
        assert_eq!(layout.model_to_view(0, Bias::Backward), Some(Rect::new(0, 0, 0, 1)));
    }
}
