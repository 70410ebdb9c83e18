//! Error types for document operations.

use std::collections::TryReserveError;
use std::fmt;

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error reported by a document listener.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for document operations.
#[derive(Debug)]
pub enum Error {
    /// Offset or length outside the valid range. Raised before any mutation.
    BadOffset {
        offset: usize,
        length: usize,
        limit: usize,
    },
    /// Write access requested while listeners are being notified.
    ConcurrentModification(&'static str),
    /// Growing the content buffer failed.
    Allocation(TryReserveError),
    /// The edit is not in a state that can be undone.
    CannotUndo,
    /// The edit is not in a state that can be redone.
    CannotRedo,
    /// One or more listeners failed. Every listener was still notified.
    Listeners(Vec<ListenerError>),
}

impl Error {
    pub(crate) fn bad_offset(offset: usize, length: usize, limit: usize) -> Self {
        Self::BadOffset {
            offset,
            length,
            limit,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadOffset {
                offset,
                length,
                limit,
            } => {
                write!(
                    f,
                    "range {offset}+{length} out of bounds for document of length {limit}"
                )
            }
            Self::ConcurrentModification(msg) => write!(f, "concurrent modification: {msg}"),
            Self::Allocation(e) => write!(f, "content allocation failed: {e}"),
            Self::CannotUndo => write!(f, "edit cannot be undone"),
            Self::CannotRedo => write!(f, "edit cannot be redone"),
            Self::Listeners(errors) => {
                write!(f, "{} listener(s) failed", errors.len())?;
                for e in errors {
                    write!(f, "; {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            Self::Listeners(errors) => errors
                .first()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Self::Allocation(e)
    }
}
