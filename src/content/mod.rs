//! Document content: a gap buffer with edit-tracking positions.

mod edit;
mod gap;
mod position;

pub use edit::{ContentEdit, ContentEditKind};
pub use gap::{DEFAULT_INITIAL_CAPACITY, GapContent};
pub use position::{Bias, Position};
