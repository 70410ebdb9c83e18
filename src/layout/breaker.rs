//! Where a row may begin.

use unicode_segmentation::UnicodeSegmentation;

/// Finds row-break opportunities in a paragraph.
pub trait LineBreaker: Send + Sync {
    /// Byte offsets into `text`, ascending, at which a new row may start.
    /// Offsets must fall on grapheme boundaries.
    fn opportunities(&self, text: &str) -> Vec<usize>;
}

/// Breaks after runs of whitespace, so words stay whole.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordBreaker;

impl LineBreaker for WordBreaker {
    fn opportunities(&self, text: &str) -> Vec<usize> {
        let mut out = Vec::new();
        let mut after_space = false;
        for (i, word) in text.split_word_bound_indices() {
            let is_ws = word.chars().all(char::is_whitespace);
            if after_space && !is_ws {
                out.push(i);
            }
            after_space = is_ws;
        }
        out
    }
}

/// Breaks between any two graphemes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CharBreaker;

impl LineBreaker for CharBreaker {
    fn opportunities(&self, text: &str) -> Vec<usize> {
        text.grapheme_indices(true).map(|(i, _)| i).skip(1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_break_after_spaces() {
        assert_eq!(WordBreaker.opportunities("ab cd  ef"), vec![3, 7]);
        assert!(WordBreaker.opportunities("abcdef").is_empty());
    }

    #[test]
    fn chars_break_between_graphemes() {
        assert_eq!(CharBreaker.opportunities("ab"), vec![1]);
        assert_eq!(CharBreaker.opportunities("e\u{0301}x"), vec![3]);
    }
}
