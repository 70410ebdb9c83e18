//! Immutable attribute sets and their builder.

use super::keys::{self, AttributeKey, AttributeValue};
use crate::bidi::Direction;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Sets with at most this many entries are interned by default.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 9;

#[derive(Clone, Debug)]
pub(crate) enum Entries {
    /// Sorted by key.
    Small(Vec<(AttributeKey, AttributeValue)>),
    Large(BTreeMap<AttributeKey, AttributeValue>),
}

impl Entries {
    fn len(&self) -> usize {
        match self {
            Self::Small(v) => v.len(),
            Self::Large(m) => m.len(),
        }
    }

    fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        match self {
            Self::Small(v) => v
                .binary_search_by(|(k, _)| k.cmp(key))
                .ok()
                .map(|idx| &v[idx].1),
            Self::Large(m) => m.get(key),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&AttributeKey, &AttributeValue)> + '_> {
        match self {
            Self::Small(v) => Box::new(v.iter().map(|(k, v)| (k, v))),
            Self::Large(m) => Box::new(m.iter()),
        }
    }
}

/// Shared payload of an [`AttributeSet`]; also the interning key.
#[derive(Clone, Debug)]
pub(crate) struct AttributeData {
    pub(crate) entries: Entries,
    pub(crate) resolve_parent: Option<AttributeSet>,
}

impl AttributeData {
    pub(crate) fn from_map(
        map: BTreeMap<AttributeKey, AttributeValue>,
        resolve_parent: Option<AttributeSet>,
        threshold: usize,
    ) -> Self {
        let entries = if map.len() <= threshold {
            Entries::Small(map.into_iter().collect())
        } else {
            Entries::Large(map)
        };
        Self {
            entries,
            resolve_parent,
        }
    }

    pub(crate) fn is_small(&self) -> bool {
        matches!(self.entries, Entries::Small(_))
    }
}

impl PartialEq for AttributeData {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.resolve_parent == other.resolve_parent
            && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for AttributeData {}

impl Hash for AttributeData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.len().hash(state);
        for (k, v) in self.entries.iter() {
            k.hash(state);
            v.hash(state);
        }
        self.resolve_parent.hash(state);
    }
}

/// An immutable attribute mapping with an optional resolve parent.
///
/// Cloning is cheap. Equality is structural: two sets with the same entries
/// and equal resolve parents are equal whether or not they share storage.
#[derive(Clone)]
pub struct AttributeSet(pub(crate) Arc<AttributeData>);

impl AttributeSet {
    /// The empty set with no resolve parent.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::new(AttributeData {
            entries: Entries::Small(Vec::new()),
            resolve_parent: None,
        }))
    }

    /// Start building a set.
    #[must_use]
    pub fn builder() -> AttributeBuilder {
        AttributeBuilder::new()
    }

    /// Number of locally defined attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.entries.len()
    }

    /// True when no attribute is defined locally and there is no resolve parent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.0.resolve_parent.is_none()
    }

    /// Look up `key` locally, then along the resolve-parent chain.
    #[must_use]
    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        let mut set = self;
        loop {
            if let Some(value) = set.0.entries.get(key) {
                return Some(value);
            }
            set = set.0.resolve_parent.as_ref()?;
        }
    }

    /// Look up `key` in this set only.
    #[must_use]
    pub fn get_local(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        self.0.entries.get(key)
    }

    /// True if `key` is defined locally.
    #[must_use]
    pub fn is_defined(&self, key: &AttributeKey) -> bool {
        self.0.entries.get(key).is_some()
    }

    /// True if `key` resolves to `value`.
    #[must_use]
    pub fn contains(&self, key: &AttributeKey, value: &AttributeValue) -> bool {
        self.get(key) == Some(value)
    }

    /// True if every local entry of `other` resolves to the same value here.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other.iter().all(|(k, v)| self.contains(k, v))
    }

    /// Iterate local entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeValue)> {
        self.0.entries.iter()
    }

    /// The set consulted for keys not defined locally.
    #[must_use]
    pub fn resolve_parent(&self) -> Option<&Self> {
        self.0.resolve_parent.as_ref()
    }

    /// True if both handles share storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True if this set is stored in the compact, internable form.
    #[must_use]
    pub fn is_compact(&self) -> bool {
        self.0.is_small()
    }

    /// Bidi embedding level of a run element, 0 when undefined.
    #[must_use]
    pub fn bidi_level(&self) -> u8 {
        self.get(&keys::BIDI_LEVEL)
            .and_then(AttributeValue::as_int)
            .and_then(|level| u8::try_from(level).ok())
            .unwrap_or(0)
    }

    /// Explicit paragraph direction, if any.
    #[must_use]
    pub fn run_direction(&self) -> Option<Direction> {
        self.get(&keys::RUN_DIRECTION)
            .and_then(AttributeValue::as_direction)
    }

    /// Element name override, if any.
    #[must_use]
    pub fn element_name(&self) -> Option<&str> {
        self.get_local(&keys::NAME).and_then(AttributeValue::as_text)
    }

    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.flag(&keys::BOLD)
    }

    #[must_use]
    pub fn is_italic(&self) -> bool {
        self.flag(&keys::ITALIC)
    }

    #[must_use]
    pub fn is_underline(&self) -> bool {
        self.flag(&keys::UNDERLINE)
    }

    fn flag(&self, key: &AttributeKey) -> bool {
        self.get(key)
            .and_then(AttributeValue::as_bool)
            .unwrap_or(false)
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for AttributeSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for AttributeSet {}

impl Hash for AttributeSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        if let Some(parent) = self.resolve_parent() {
            map.entry(&"$resolver", parent);
        }
        map.finish()
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

/// Mutable accumulation of attributes, frozen into an [`AttributeSet`].
///
/// # Examples
///
/// ```
/// use docmodel::attributes::{AttributeSet, keys};
///
/// let bold = AttributeSet::builder().with(keys::BOLD, true).build();
/// assert!(bold.is_bold());
/// ```
#[derive(Clone, Debug, Default)]
pub struct AttributeBuilder {
    map: BTreeMap<AttributeKey, AttributeValue>,
    resolve_parent: Option<AttributeSet>,
}

impl AttributeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the local entries and resolve parent of `base`.
    #[must_use]
    pub fn from_set(base: &AttributeSet) -> Self {
        Self {
            map: base
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            resolve_parent: base.resolve_parent().cloned(),
        }
    }

    /// Add an entry, replacing any previous value for `key`.
    #[must_use]
    pub fn with(mut self, key: AttributeKey, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set the resolve parent.
    #[must_use]
    pub fn resolve_parent(mut self, parent: AttributeSet) -> Self {
        self.resolve_parent = Some(parent);
        self
    }

    pub fn insert(&mut self, key: AttributeKey, value: impl Into<AttributeValue>) {
        self.map.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &AttributeKey) {
        self.map.remove(key);
    }

    pub fn set_resolve_parent(&mut self, parent: Option<AttributeSet>) {
        self.resolve_parent = parent;
    }

    /// Copy every local entry of `other`; adopts its resolve parent when set.
    pub fn add_all(&mut self, other: &AttributeSet) {
        for (k, v) in other.iter() {
            self.map.insert(k.clone(), v.clone());
        }
        if let Some(parent) = other.resolve_parent() {
            self.resolve_parent = Some(parent.clone());
        }
    }

    /// Remove every key of `other` whose value matches here.
    pub fn remove_matching(&mut self, other: &AttributeSet) {
        for (k, v) in other.iter() {
            if self.map.get(k) == Some(v) {
                self.map.remove(k);
            }
        }
    }

    /// Drop all entries and the resolve parent.
    pub fn clear(&mut self) {
        self.map.clear();
        self.resolve_parent = None;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && self.resolve_parent.is_none()
    }

    /// Freeze without interning, using the default compression threshold.
    #[must_use]
    pub fn build(self) -> AttributeSet {
        AttributeSet(Arc::new(self.into_data(DEFAULT_COMPRESSION_THRESHOLD)))
    }

    pub(crate) fn into_data(self, threshold: usize) -> AttributeData {
        AttributeData::from_map(self.map, self.resolve_parent, threshold)
    }
}
