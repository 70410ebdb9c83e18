//! `docmodel` - Observable rich-text document core
//!
//! A styled text model in the shape used by editor components: content lives
//! in a gap buffer with positions that follow edits, structure lives in a
//! paragraph/run element tree that is restructured incrementally, a parallel
//! tree tracks bidirectional embedding levels, and every edit is an event
//! that can be undone and redone.
//!
//! # Quick start
//!
//! ```
//! use docmodel::{AttributeSet, Document, UndoLog, keys};
//!
//! let doc = Document::new();
//! let log = UndoLog::attach(&doc);
//!
//! doc.insert_string(0, "Hello\nworld", None).unwrap();
//! let bold = AttributeSet::builder().with(keys::BOLD, true).build();
//! doc.set_character_attributes(0, 5, &bold, false).unwrap();
//!
//! assert!(doc.character_element(2).attributes().is_bold());
//! assert_eq!(doc.root_element().element_count(), 2);
//!
//! log.undo().unwrap();
//! assert!(!doc.character_element(2).attributes().is_bold());
//! ```

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Intentional layout unit casts
#![allow(clippy::cast_possible_wrap)] // Index arithmetic in the bidi splice
#![allow(clippy::module_name_repetitions)] // Allow DocumentEvent, ElementEdit etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Structural faults are documented once, on Error
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Attribute sets are cheap Arc clones
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::significant_drop_tightening)] // Lock guards span whole transactions

pub mod attributes;
pub mod bidi;
pub mod content;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod layout;
pub mod structure;
pub mod undo;

// Re-export core types at crate root
pub use attributes::{AttributeBuilder, AttributeContext, AttributeKey, AttributeSet, AttributeValue, keys};
pub use bidi::{BidiAnalyzer, Direction, UnicodeBidiAnalyzer};
pub use content::{Bias, GapContent, Position};
pub use document::{
    Document, DocumentConfig, DocumentEvent, DocumentFlags, DocumentListener, EventKind,
    UndoableEditListener,
};
pub use element::{AttributeEdit, Element, ElementEdit};
pub use error::{Error, ListenerError, Result};
pub use event::{LogLevel, emit_event, emit_log, set_event_callback, set_log_callback};
pub use structure::{Directive, DirectiveKind, JoinMode};
pub use undo::UndoLog;
