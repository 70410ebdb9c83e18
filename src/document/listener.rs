//! Change and undoable-edit observers.

use super::event::DocumentEvent;
use crate::error::ListenerError;

/// Observer of committed document changes.
///
/// Called with the write lock held; reading the document is fine, mutating it
/// fails with [`Error::ConcurrentModification`](crate::Error::ConcurrentModification).
/// Closures taking `&DocumentEvent` implement this trait.
pub trait DocumentListener: Send + Sync {
    fn changed(&self, event: &DocumentEvent) -> Result<(), ListenerError>;
}

impl<F> DocumentListener for F
where
    F: Fn(&DocumentEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn changed(&self, event: &DocumentEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Observer receiving each committed edit as an undoable unit.
pub trait UndoableEditListener: Send + Sync {
    fn undoable_edit_happened(&self, edit: &DocumentEvent) -> Result<(), ListenerError>;
}
