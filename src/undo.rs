//! Bounded undo history for a document.
//!
//! [`UndoLog`] listens for undoable edits and stacks them in groups. Each
//! event is its own group unless edits are bracketed with
//! [`begin_group`](UndoLog::begin_group) / [`end_group`](UndoLog::end_group),
//! in which case the whole bracket undoes and redoes as one unit.

use crate::document::{Document, DocumentEvent, UndoableEditListener};
use crate::error::{Error, ListenerError, Result};
use crate::event::{LogLevel, emit_log};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default maximum number of undo groups to retain.
pub const DEFAULT_MAX_HISTORY_DEPTH: usize = 1000;

#[derive(Debug)]
struct History {
    undo_stack: Vec<Vec<DocumentEvent>>,
    redo_stack: Vec<Vec<DocumentEvent>>,
    current_group: Vec<DocumentEvent>,
    group_depth: usize,
    /// Oldest groups are dropped past this many.
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current_group: Vec::new(),
            group_depth: 0,
            max_depth: DEFAULT_MAX_HISTORY_DEPTH,
        }
    }
}

impl History {
    fn push(&mut self, event: DocumentEvent) {
        self.current_group.push(event);
        self.redo_stack.clear();
        if self.group_depth == 0 {
            self.commit();
        }
    }

    fn commit(&mut self) {
        if !self.current_group.is_empty() {
            self.undo_stack
                .push(std::mem::take(&mut self.current_group));
            if self.undo_stack.len() > self.max_depth {
                let excess = self.undo_stack.len() - self.max_depth;
                self.undo_stack.drain(..excess);
            }
        }
    }
}

/// Undo/redo stack fed by a document's undoable-edit notifications.
///
/// ```
/// use docmodel::{Document, UndoLog};
///
/// let doc = Document::new();
/// let log = UndoLog::attach(&doc);
/// doc.insert_string(0, "hello", None).unwrap();
/// assert!(log.undo().unwrap());
/// assert!(doc.is_empty());
/// assert!(log.redo().unwrap());
/// assert_eq!(doc.contents(), "hello");
/// ```
#[derive(Debug, Default)]
pub struct UndoLog {
    history: Mutex<History>,
}

impl UndoLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log keeping at most `max_depth` groups.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            history: Mutex::new(History {
                max_depth,
                ..History::default()
            }),
        }
    }

    /// Create a log and register it with `document`.
    #[must_use]
    pub fn attach(document: &Document) -> Arc<Self> {
        let log = Arc::new(Self::new());
        document.add_undoable_edit_listener(Arc::clone(&log) as Arc<dyn UndoableEditListener>);
        log
    }

    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_max_depth(&self, max_depth: usize) {
        let mut history = self.history();
        history.max_depth = max_depth;
        if history.undo_stack.len() > max_depth {
            let excess = history.undo_stack.len() - max_depth;
            history.undo_stack.drain(..excess);
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.history().max_depth
    }

    /// Start collecting edits into one unit. Groups nest; only the outermost
    /// [`end_group`](Self::end_group) closes the unit.
    pub fn begin_group(&self) {
        self.history().group_depth += 1;
    }

    pub fn end_group(&self) {
        let mut history = self.history();
        history.group_depth = history.group_depth.saturating_sub(1);
        if history.group_depth == 0 {
            history.commit();
        }
    }

    /// Undo the most recent group. Returns `Ok(false)` if there is nothing to undo.
    ///
    /// An open group is closed first. Listener failures during the replay
    /// are returned after the whole group has been undone. Any other failure
    /// redoes the events already undone and leaves the group on the undo
    /// stack.
    pub fn undo(&self) -> Result<bool> {
        let group = {
            let mut history = self.history();
            history.group_depth = 0;
            history.commit();
            history.undo_stack.pop()
        };
        let Some(group) = group else {
            return Ok(false);
        };

        let mut failures = Vec::new();
        for (done, event) in group.iter().rev().enumerate() {
            if let Err(e) = collect(event.undo(), &mut failures) {
                for undone in &group[group.len() - done..] {
                    restore(undone.redo(), "redo");
                }
                self.history().undo_stack.push(group);
                return Err(e);
            }
        }
        self.history().redo_stack.push(group);
        finish(failures)
    }

    /// Redo the most recently undone group. Returns `Ok(false)` if there is nothing to redo.
    ///
    /// On failure the events already redone are undone again and the group
    /// stays on the redo stack.
    pub fn redo(&self) -> Result<bool> {
        let Some(group) = self.history().redo_stack.pop() else {
            return Ok(false);
        };

        let mut failures = Vec::new();
        for (done, event) in group.iter().enumerate() {
            if let Err(e) = collect(event.redo(), &mut failures) {
                for redone in group[..done].iter().rev() {
                    restore(redone.undo(), "undo");
                }
                self.history().redo_stack.push(group);
                return Err(e);
            }
        }
        self.history().undo_stack.push(group);
        finish(failures)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        let history = self.history();
        !history.undo_stack.is_empty() || !history.current_group.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.history().redo_stack.is_empty()
    }

    /// Number of complete groups available to undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.history().undo_stack.len()
    }

    pub fn clear(&self) {
        let mut history = self.history();
        history.undo_stack.clear();
        history.redo_stack.clear();
        history.current_group.clear();
        history.group_depth = 0;
    }
}

impl UndoableEditListener for UndoLog {
    fn undoable_edit_happened(&self, edit: &DocumentEvent) -> std::result::Result<(), ListenerError> {
        self.history().push(edit.clone());
        Ok(())
    }
}

fn collect(step: Result<()>, failures: &mut Vec<ListenerError>) -> Result<()> {
    match step {
        Ok(()) => Ok(()),
        Err(Error::Listeners(errors)) => {
            failures.extend(errors);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Outcome of putting back one event of a group whose replay failed.
fn restore(step: Result<()>, action: &str) {
    match step {
        Ok(()) | Err(Error::Listeners(_)) => {}
        Err(e) => emit_log(LogLevel::Error, &format!("undo log could not {action} an event: {e}")),
    }
}

fn finish(failures: Vec<ListenerError>) -> Result<bool> {
    if failures.is_empty() {
        Ok(true)
    } else {
        Err(Error::Listeners(failures))
    }
}
