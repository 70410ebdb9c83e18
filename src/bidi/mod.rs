//! Bidirectional text support.
//!
//! The document keeps a flat "bidi tree" next to the paragraph tree: one root
//! whose leaves are maximal runs sharing an embedding level. Run levels come
//! from a pluggable [`BidiAnalyzer`]; [`UnicodeBidiAnalyzer`] implements it on
//! top of `unicode-bidi` (UAX #9).

mod analyzer;
pub(crate) mod segmenter;

pub use analyzer::{BidiAnalyzer, BidiRun, UnicodeBidiAnalyzer, runs_from_levels};

use unicode_bidi::BidiClass;

/// Paragraph direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Base embedding level of a paragraph running in this direction.
    #[must_use]
    pub const fn base_level(self) -> u8 {
        match self {
            Self::Ltr => 0,
            Self::Rtl => 1,
        }
    }

    /// Direction of text at embedding `level`.
    #[must_use]
    pub const fn of_level(level: u8) -> Self {
        if level % 2 == 0 { Self::Ltr } else { Self::Rtl }
    }
}

/// True if `text` contains characters that need bidi segmentation.
///
/// Right-to-left letters, Arabic numbers and explicit embedding or isolate
/// controls all qualify. Pure left-to-right text never does.
#[must_use]
pub fn needs_bidi(text: &str) -> bool {
    text.chars().any(|ch| {
        matches!(
            unicode_bidi::bidi_class(ch),
            BidiClass::R
                | BidiClass::AL
                | BidiClass::AN
                | BidiClass::RLE
                | BidiClass::RLO
                | BidiClass::LRE
                | BidiClass::LRO
                | BidiClass::RLI
                | BidiClass::LRI
                | BidiClass::FSI
                | BidiClass::PDF
                | BidiClass::PDI
        )
    })
}

/// Direction of the first strong character in `text`, if any.
#[must_use]
pub fn first_strong_direction(text: &str) -> Option<Direction> {
    text.chars()
        .find_map(|ch| match unicode_bidi::bidi_class(ch) {
            BidiClass::L => Some(Direction::Ltr),
            BidiClass::R | BidiClass::AL => Some(Direction::Rtl),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltr_text_does_not_need_bidi() {
        assert!(!needs_bidi("Hello, world! 12345"));
        assert!(!needs_bidi(""));
    }

    #[test]
    fn rtl_letters_and_controls_need_bidi() {
        assert!(needs_bidi("Hello שלום"));
        assert!(needs_bidi("مرحبا"));
        assert!(needs_bidi("abc\u{202E}def\u{202C}"));
    }

    #[test]
    fn first_strong_skips_neutrals() {
        assert_eq!(first_strong_direction("123 abc"), Some(Direction::Ltr));
        assert_eq!(first_strong_direction("  שלום abc"), Some(Direction::Rtl));
        assert_eq!(first_strong_direction("12345"), None);
    }

    #[test]
    fn level_parity_gives_direction() {
        assert_eq!(Direction::of_level(0), Direction::Ltr);
        assert_eq!(Direction::of_level(1), Direction::Rtl);
        assert_eq!(Direction::of_level(2), Direction::Ltr);
        assert_eq!(Direction::Rtl.base_level(), 1);
    }
}
