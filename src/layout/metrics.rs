//! Glyph measurement for the flow layout.

use crate::attributes::{AttributeSet, keys};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width calculation method for ambiguous-width characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidthMethod {
    /// POSIX-like wcwidth: ambiguous width = 1.
    #[default]
    WcWidth,
    /// Unicode East Asian Width: ambiguous width = 2.
    Unicode,
}

/// Measures graphemes for layout.
///
/// `column` is the x position the grapheme would start at, so tab stops can
/// be honoured.
pub trait TextMetrics: Send + Sync {
    fn width(&self, grapheme: &str, attributes: &AttributeSet, column: u32) -> u32;

    /// Height of a row holding text with `attributes`.
    fn line_height(&self, _attributes: &AttributeSet) -> u32 {
        1
    }
}

/// Fixed-cell metrics: every column is one cell, every row one cell high.
#[derive(Clone, Copy, Debug)]
pub struct CellMetrics {
    method: WidthMethod,
    tab_width: u32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            method: WidthMethod::WcWidth,
            tab_width: 4,
        }
    }
}

impl CellMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(mut self, method: WidthMethod) -> Self {
        self.method = method;
        self
    }

    /// Tab stop interval in cells; zero is treated as one.
    #[must_use]
    pub fn with_tab_width(mut self, tab_width: u32) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    #[must_use]
    pub fn method(&self) -> WidthMethod {
        self.method
    }

    #[must_use]
    pub fn tab_width(&self) -> u32 {
        self.tab_width
    }
}

impl TextMetrics for CellMetrics {
    fn width(&self, grapheme: &str, _attributes: &AttributeSet, column: u32) -> u32 {
        if grapheme == "\t" {
            return self.tab_width - column % self.tab_width;
        }
        // Fast path: ASCII printable characters are always width 1
        if grapheme.len() == 1 && (b' '..=b'~').contains(&grapheme.as_bytes()[0]) {
            return 1;
        }
        if grapheme.chars().all(char::is_control) {
            return 0;
        }
        display_width_with_method(grapheme, self.method) as u32
    }
}

/// Cell metrics where a paragraph or run with a font size of `n` is `n`
/// rows high and every glyph is scaled by the same factor.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScaledCellMetrics {
    cells: CellMetrics,
}

impl ScaledCellMetrics {
    #[must_use]
    pub fn new(cells: CellMetrics) -> Self {
        Self { cells }
    }

    fn scale(attributes: &AttributeSet) -> u32 {
        attributes
            .get(&keys::FONT_SIZE)
            .and_then(|v| v.as_int())
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(1)
            .max(1)
    }
}

impl TextMetrics for ScaledCellMetrics {
    fn width(&self, grapheme: &str, attributes: &AttributeSet, column: u32) -> u32 {
        let scale = Self::scale(attributes);
        self.cells.width(grapheme, attributes, column / scale) * scale
    }

    fn line_height(&self, attributes: &AttributeSet) -> u32 {
        Self::scale(attributes)
    }
}

/// Display width of a string in cells using a specific method.
#[must_use]
pub fn display_width_with_method(s: &str, method: WidthMethod) -> usize {
    match method {
        WidthMethod::WcWidth => UnicodeWidthStr::width(s),
        WidthMethod::Unicode => UnicodeWidthStr::width_cjk(s),
    }
}

/// Display width of a character in cells using a specific method.
#[must_use]
pub fn display_width_char_with_method(c: char, method: WidthMethod) -> usize {
    match method {
        WidthMethod::WcWidth => UnicodeWidthChar::width(c).unwrap_or(0),
        WidthMethod::Unicode => UnicodeWidthChar::width_cjk(c).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> AttributeSet {
        AttributeSet::empty()
    }

    #[test]
    fn ascii_and_cjk_widths() {
        let m = CellMetrics::new();
        assert_eq!(m.width("a", &plain(), 0), 1);
        assert_eq!(m.width("漢", &plain(), 0), 2);
        assert_eq!(m.width("\n", &plain(), 3), 0);
    }

    #[test]
    fn tabs_advance_to_the_next_stop() {
        let m = CellMetrics::new().with_tab_width(4);
        assert_eq!(m.width("\t", &plain(), 0), 4);
        assert_eq!(m.width("\t", &plain(), 1), 3);
        assert_eq!(m.width("\t", &plain(), 4), 4);
    }

    #[test]
    fn combining_sequence_is_one_cell() {
        let m = CellMetrics::new();
        assert_eq!(m.width("e\u{0301}", &plain(), 0), 1);
    }

    #[test]
    fn ambiguous_width_follows_the_method() {
        let ch = '①';
        assert_eq!(display_width_char_with_method(ch, WidthMethod::WcWidth), 1);
        assert_eq!(display_width_char_with_method(ch, WidthMethod::Unicode), 2);
        let wide = CellMetrics::new().with_method(WidthMethod::Unicode);
        assert_eq!(wide.width("①", &plain(), 0), 2);
    }

    #[test]
    fn scaled_metrics_follow_font_size() {
        let m = ScaledCellMetrics::default();
        let big = AttributeSet::builder().with(keys::FONT_SIZE, 3_i64).build();
        assert_eq!(m.width("a", &big, 0), 3);
        assert_eq!(m.line_height(&big), 3);
        assert_eq!(m.line_height(&plain()), 1);
    }
}
