//! Immutable, interned attribute sets.
//!
//! Key types:
//!
//! - [`AttributeSet`]: immutable key/value mapping with a resolve parent
//! - [`AttributeBuilder`]: mutable accumulation, frozen into a set
//! - [`AttributeContext`]: interning factory for small sets
//! - [`keys`]: well-known attribute keys
//!
//! # Examples
//!
//! ```
//! use docmodel::attributes::{AttributeContext, AttributeSet, keys};
//!
//! let ctx = AttributeContext::new();
//! let base = AttributeSet::builder().with(keys::FONT_SIZE, 12i64).build();
//! let run = ctx.add_attribute(&ctx.empty(), keys::BOLD, true);
//! let run = ctx.with_resolve_parent(&run, Some(base));
//!
//! assert!(run.is_bold());
//! assert_eq!(run.get(&keys::FONT_SIZE).and_then(|v| v.as_int()), Some(12));
//! ```

mod context;
pub mod keys;
mod set;

pub use context::{AttributeContext, PoolStats};
pub use keys::{AttributeKey, AttributeValue};
pub use set::{AttributeBuilder, AttributeSet, DEFAULT_COMPRESSION_THRESHOLD};
