//! Paragraph-level bidi analysis.

use super::Direction;
use std::fmt;
use std::ops::Range;
use unicode_bidi::{BidiInfo, Level};

/// A maximal span of one paragraph sharing an embedding level.
///
/// `range` is in chars, relative to the start of the analysed paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidiRun {
    pub level: u8,
    pub range: Range<usize>,
}

/// Source of embedding levels for paragraph text.
///
/// Implementations receive one paragraph, including its trailing line break,
/// and must return runs that cover every char in order with no gaps.
pub trait BidiAnalyzer: Send + Sync {
    /// Resolve the runs of `paragraph`. `direction` forces the paragraph
    /// level; `None` derives it from the first strong character, defaulting
    /// to left-to-right.
    fn runs(&self, paragraph: &str, direction: Option<Direction>) -> Vec<BidiRun>;

    /// Embedding level of every char of `paragraph`.
    fn levels(&self, paragraph: &str, direction: Option<Direction>) -> Vec<u8> {
        let mut levels = Vec::with_capacity(paragraph.chars().count());
        for run in self.runs(paragraph, direction) {
            levels.extend(std::iter::repeat_n(run.level, run.range.len()));
        }
        levels
    }
}

/// Collapse per-char levels into runs.
#[must_use]
pub fn runs_from_levels(levels: &[u8]) -> Vec<BidiRun> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=levels.len() {
        if i == levels.len() || levels[i] != levels[start] {
            runs.push(BidiRun {
                level: levels[start],
                range: start..i,
            });
            start = i;
        }
    }
    runs
}

/// [`BidiAnalyzer`] backed by the `unicode-bidi` crate.
///
/// Levels are taken after rule L1, so trailing whitespace and separators sit
/// at the paragraph level.
#[derive(Clone, Copy, Default)]
pub struct UnicodeBidiAnalyzer;

impl UnicodeBidiAnalyzer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl fmt::Debug for UnicodeBidiAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UnicodeBidiAnalyzer")
    }
}

impl BidiAnalyzer for UnicodeBidiAnalyzer {
    fn runs(&self, paragraph: &str, direction: Option<Direction>) -> Vec<BidiRun> {
        runs_from_levels(&self.levels(paragraph, direction))
    }

    fn levels(&self, paragraph: &str, direction: Option<Direction>) -> Vec<u8> {
        if paragraph.is_empty() {
            return Vec::new();
        }
        let forced = direction.map(|d| match d {
            Direction::Ltr => Level::ltr(),
            Direction::Rtl => Level::rtl(),
        });
        let info = BidiInfo::new(paragraph, forced);

        let mut levels = Vec::with_capacity(paragraph.chars().count());
        for para in &info.paragraphs {
            let line = para.range.clone();
            // per-byte levels over the whole text; keep this paragraph's char starts
            let by_byte = info.reordered_levels(para, line.clone());
            levels.extend(
                paragraph[line.clone()]
                    .char_indices()
                    .map(|(i, _)| by_byte[line.start + i].number()),
            );
        }
        levels
    }
}
