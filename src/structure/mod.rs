//! Incremental restructuring of the paragraph tree.
//!
//! [`ElementBuffer`] applies one edit to the tree: an insert described by a
//! [`Directive`] sequence, a removal, or an attribute-change split. It keeps a
//! stack of per-branch change frames while it walks the tree and splices all
//! recorded changes at the end, returning one [`ElementEdit`](crate::element::ElementEdit)
//! per changed branch.

mod change;
mod directive;
mod element_buffer;
mod remove;

pub use directive::{Directive, DirectiveKind, JoinMode};
pub(crate) use element_buffer::ElementBuffer;
