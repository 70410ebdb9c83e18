//! Attribute keys, values and the well-known keys used by the document.

use crate::bidi::Direction;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Name of an attribute.
///
/// Well-known keys are `const` and borrow a static string; embedders can
/// create their own with [`AttributeKey::new`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey(Cow<'static, str>);

impl AttributeKey {
    /// Create a key from a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a key from an owned name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The key's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored under an [`AttributeKey`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Text(Arc<str>),
    Direction(Direction),
}

impl AttributeValue {
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_direction(&self) -> Option<Direction> {
        match self {
            Self::Direction(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Direction(d) => write!(f, "{d:?}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<Direction> for AttributeValue {
    fn from(value: Direction) -> Self {
        Self::Direction(value)
    }
}

/// Overrides the element name reported by [`Element::name`](crate::Element::name).
pub const NAME: AttributeKey = AttributeKey::from_static("$ename");
/// Bold text.
pub const BOLD: AttributeKey = AttributeKey::from_static("bold");
/// Italic text.
pub const ITALIC: AttributeKey = AttributeKey::from_static("italic");
/// Underlined text.
pub const UNDERLINE: AttributeKey = AttributeKey::from_static("underline");
/// Struck-through text.
pub const STRIKETHROUGH: AttributeKey = AttributeKey::from_static("strikethrough");
/// Font family name.
pub const FONT_FAMILY: AttributeKey = AttributeKey::from_static("family");
/// Font size in points.
pub const FONT_SIZE: AttributeKey = AttributeKey::from_static("size");
/// Foreground colour as `0xRRGGBB`.
pub const FOREGROUND: AttributeKey = AttributeKey::from_static("foreground");
/// Paragraph left indent in layout units.
pub const LEFT_INDENT: AttributeKey = AttributeKey::from_static("left_indent");
/// Embedding level of a bidi run element.
pub const BIDI_LEVEL: AttributeKey = AttributeKey::from_static("bidi_level");
/// Explicit paragraph direction.
pub const RUN_DIRECTION: AttributeKey = AttributeKey::from_static("run_direction");
