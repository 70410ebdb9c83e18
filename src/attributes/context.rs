//! Interning pool for attribute sets.
//!
//! Small sets (at most `compression_threshold` entries) are interned: equal
//! content maps to one shared, weakly held instance. Larger sets skip the
//! pool and are plain copy-on-write values, which keeps the pool bounded by
//! the number of distinct small sets still referenced somewhere.
//!
//! # Invariants
//!
//! - The pool never keeps a set alive; entries whose last handle dropped are
//!   reclaimed on the next purge.
//! - Operations never mutate their `base` argument.

use super::keys::{AttributeKey, AttributeValue};
use super::set::{AttributeBuilder, AttributeData, AttributeSet, DEFAULT_COMPRESSION_THRESHOLD};
use crate::event::{LogLevel, emit_log};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

/// Minimum number of pool entries before dead entries are purged.
const MIN_PURGE_THRESHOLD: usize = 64;

/// Statistics about pool utilization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Entries in the pool, including ones whose set was dropped.
    pub cached: usize,
    /// Entries whose set is still referenced.
    pub live: usize,
}

#[derive(Debug)]
struct InternPool {
    index: HashMap<AttributeData, Weak<AttributeData>>,
    purge_at: usize,
}

impl InternPool {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            purge_at: MIN_PURGE_THRESHOLD,
        }
    }

    fn intern(&mut self, data: AttributeData) -> AttributeSet {
        if let Some(existing) = self.index.get(&data).and_then(Weak::upgrade) {
            return AttributeSet(existing);
        }
        if self.index.len() >= self.purge_at {
            self.purge();
        }
        let shared = Arc::new(data.clone());
        self.index.insert(data, Arc::downgrade(&shared));
        AttributeSet(shared)
    }

    fn purge(&mut self) {
        let before = self.index.len();
        self.index.retain(|_, weak| weak.strong_count() > 0);
        self.purge_at = (self.index.len() * 2).max(MIN_PURGE_THRESHOLD);
        emit_log(
            LogLevel::Debug,
            &format!(
                "attribute pool purged {} of {before} entries",
                before - self.index.len()
            ),
        );
    }
}

/// Factory for attribute sets, sharing equal small sets.
///
/// # Examples
///
/// ```
/// use docmodel::attributes::{AttributeContext, keys};
///
/// let ctx = AttributeContext::new();
/// let a = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
/// let b = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
/// assert!(a.ptr_eq(&b));
/// ```
#[derive(Debug)]
pub struct AttributeContext {
    threshold: usize,
    pool: Mutex<InternPool>,
}

impl Default for AttributeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeContext {
    /// Create a context with the default compression threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_COMPRESSION_THRESHOLD)
    }

    /// Create a context interning sets of at most `threshold` entries.
    #[must_use]
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            threshold,
            pool: Mutex::new(InternPool::new()),
        }
    }

    /// The process-wide shared context.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<AttributeContext>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    /// Largest set size that is interned.
    #[must_use]
    pub fn compression_threshold(&self) -> usize {
        self.threshold
    }

    /// The interned empty set.
    #[must_use]
    pub fn empty(&self) -> AttributeSet {
        self.intern(AttributeBuilder::new())
    }

    /// Freeze `builder`, interning the result when it is small enough.
    #[must_use]
    pub fn intern(&self, builder: AttributeBuilder) -> AttributeSet {
        let data = builder.into_data(self.threshold);
        if !data.is_small() {
            return AttributeSet(Arc::new(data));
        }
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .intern(data)
    }

    /// `base` plus `key = value`.
    #[must_use]
    pub fn add_attribute(
        &self,
        base: &AttributeSet,
        key: AttributeKey,
        value: impl Into<AttributeValue>,
    ) -> AttributeSet {
        let mut b = AttributeBuilder::from_set(base);
        b.insert(key, value);
        self.intern(b)
    }

    /// `base` overlaid with every local entry of `other`.
    #[must_use]
    pub fn add_attributes(&self, base: &AttributeSet, other: &AttributeSet) -> AttributeSet {
        let mut b = AttributeBuilder::from_set(base);
        b.add_all(other);
        self.intern(b)
    }

    /// `base` without `key`.
    #[must_use]
    pub fn remove_attribute(&self, base: &AttributeSet, key: &AttributeKey) -> AttributeSet {
        let mut b = AttributeBuilder::from_set(base);
        b.remove(key);
        self.intern(b)
    }

    /// `base` without any of `keys`.
    #[must_use]
    pub fn remove_attributes(&self, base: &AttributeSet, keys: &[AttributeKey]) -> AttributeSet {
        let mut b = AttributeBuilder::from_set(base);
        for key in keys {
            b.remove(key);
        }
        self.intern(b)
    }

    /// `base` without the entries of `other` that carry the same value.
    #[must_use]
    pub fn remove_matching(&self, base: &AttributeSet, other: &AttributeSet) -> AttributeSet {
        let mut b = AttributeBuilder::from_set(base);
        b.remove_matching(other);
        self.intern(b)
    }

    /// `base` with its resolve parent replaced.
    #[must_use]
    pub fn with_resolve_parent(
        &self,
        base: &AttributeSet,
        parent: Option<AttributeSet>,
    ) -> AttributeSet {
        let mut b = AttributeBuilder::from_set(base);
        b.set_resolve_parent(parent);
        self.intern(b)
    }

    /// Re-home an arbitrary set into this context.
    #[must_use]
    pub fn canonical(&self, set: &AttributeSet) -> AttributeSet {
        self.intern(AttributeBuilder::from_set(set))
    }

    /// Drop pool entries whose sets are no longer referenced.
    pub fn purge(&self) {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .purge();
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        PoolStats {
            cached: pool.index.len(),
            live: pool
                .index
                .values()
                .filter(|weak| weak.strong_count() > 0)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::keys;

    #[test]
    fn equal_small_sets_share_storage() {
        let ctx = AttributeContext::new();
        let a = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
        let b = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
        assert!(a.ptr_eq(&b));

        let c = ctx.add_attribute(&a, keys::ITALIC, true);
        let italic = ctx.add_attribute(&ctx.empty(), keys::ITALIC, true);
        let d = ctx.add_attribute(&italic, keys::BOLD, true);
        assert!(c.ptr_eq(&d));
    }

    #[test]
    fn operations_never_mutate_base() {
        let ctx = AttributeContext::new();
        let base = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
        let _more = ctx.add_attribute(&base, keys::ITALIC, true);
        let _less = ctx.remove_attribute(&base, &keys::BOLD);
        assert_eq!(base.len(), 1);
        assert!(base.is_bold());
    }

    #[test]
    fn large_sets_skip_the_pool() {
        let ctx = AttributeContext::with_threshold(2);
        let mut b = AttributeBuilder::new();
        b.insert(keys::BOLD, true);
        b.insert(keys::ITALIC, true);
        b.insert(keys::UNDERLINE, true);
        let first = ctx.intern(b.clone());
        let second = ctx.intern(b);
        assert!(!first.is_compact());
        assert!(!first.ptr_eq(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn dropped_sets_are_reclaimed() {
        let ctx = AttributeContext::new();
        let keep = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
        {
            let _temp = ctx.add_attribute(&ctx.empty(), keys::FONT_SIZE, 99i64);
        }
        ctx.purge();
        let stats = ctx.stats();
        assert_eq!(stats.cached, stats.live);
        assert!(stats.live >= 1);
        drop(keep);
    }

    #[test]
    fn remove_matching_and_resolve_parent() {
        let ctx = AttributeContext::new();
        let style = ctx.add_attribute(&ctx.empty(), keys::FONT_SIZE, 12i64);
        let base = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
        let resolved = ctx.with_resolve_parent(&base, Some(style.clone()));
        assert_eq!(resolved.resolve_parent(), Some(&style));
        assert_eq!(resolved.get(&keys::FONT_SIZE), Some(&AttributeValue::Int(12)));

        let stripped = ctx.remove_matching(&resolved, &base);
        assert!(!stripped.is_bold());
        assert_eq!(stripped.len(), 0);
    }
}
