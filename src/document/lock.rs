//! Single-writer, multi-reader document lock.
//!
//! Writers are reentrant and preferred: once a writer waits, new readers
//! block until it is done. A thread that already reads may read again
//! regardless, so nested reads never deadlock behind a waiting writer. The
//! writing thread may read freely.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct LockState {
    writer: Option<ThreadId>,
    write_depth: usize,
    readers: HashMap<ThreadId, usize>,
    waiting_writers: usize,
    notifying: bool,
}

#[derive(Debug, Default)]
pub(crate) struct DocumentLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl DocumentLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn read(&self) -> ReadGuard<'_> {
        let me = thread::current().id();
        let mut state = self.state();
        loop {
            let reentrant = state.writer == Some(me) || state.readers.contains_key(&me);
            if reentrant || (state.writer.is_none() && state.waiting_writers == 0) {
                break;
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *state.readers.entry(me).or_insert(0) += 1;
        ReadGuard { lock: self, thread: me }
    }

    /// Take the write lock, blocking while other threads hold it.
    ///
    /// Fails instead of blocking forever when the calling thread is in
    /// listener notification, or holds a read lock without the write lock.
    pub(crate) fn write(&self) -> Result<WriteGuard<'_>> {
        let me = thread::current().id();
        let mut state = self.state();
        if state.writer == Some(me) {
            if state.notifying {
                return Err(Error::ConcurrentModification(
                    "document mutated during listener notification",
                ));
            }
            state.write_depth += 1;
            return Ok(WriteGuard { lock: self });
        }
        if state.readers.contains_key(&me) {
            return Err(Error::ConcurrentModification(
                "write lock requested while holding a read lock",
            ));
        }

        state.waiting_writers += 1;
        while state.writer.is_some() || !state.readers.is_empty() {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.waiting_writers -= 1;
        state.writer = Some(me);
        state.write_depth = 1;
        Ok(WriteGuard { lock: self })
    }

    /// Mark the write lock holder as notifying listeners until the guard drops.
    pub(crate) fn notifying(&self) -> NotifyGuard<'_> {
        let previous = std::mem::replace(&mut self.state().notifying, true);
        NotifyGuard {
            lock: self,
            previous,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_write_locked_by_current_thread(&self) -> bool {
        self.state().writer == Some(thread::current().id())
    }
}

#[must_use]
pub(crate) struct ReadGuard<'a> {
    lock: &'a DocumentLock,
    thread: ThreadId,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state();
        if let Some(count) = state.readers.get_mut(&self.thread) {
            *count -= 1;
            if *count == 0 {
                state.readers.remove(&self.thread);
            }
        }
        drop(state);
        self.lock.released.notify_all();
    }
}

#[must_use]
pub(crate) struct WriteGuard<'a> {
    lock: &'a DocumentLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.lock.state();
        state.write_depth -= 1;
        if state.write_depth == 0 {
            state.writer = None;
            drop(state);
            self.lock.released.notify_all();
        }
    }
}

#[must_use]
pub(crate) struct NotifyGuard<'a> {
    lock: &'a DocumentLock,
    previous: bool,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.lock.state().notifying = self.previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn writer_is_reentrant_and_may_read() {
        let lock = DocumentLock::new();
        let outer = lock.write().unwrap();
        let inner = lock.write().unwrap();
        let read = lock.read();
        assert!(lock.is_write_locked_by_current_thread());
        drop(read);
        drop(inner);
        assert!(lock.is_write_locked_by_current_thread());
        drop(outer);
        assert!(!lock.is_write_locked_by_current_thread());
    }

    #[test]
    fn write_during_notification_fails() {
        let lock = DocumentLock::new();
        let _write = lock.write().unwrap();
        {
            let _notify = lock.notifying();
            assert!(matches!(
                lock.write(),
                Err(Error::ConcurrentModification(_))
            ));
        }
        assert!(lock.write().is_ok());
    }

    #[test]
    fn read_then_write_on_one_thread_fails_fast() {
        let lock = DocumentLock::new();
        let _read = lock.read();
        assert!(matches!(
            lock.write(),
            Err(Error::ConcurrentModification(_))
        ));
    }

    #[test]
    fn writer_waits_for_readers() {
        let lock = Arc::new(DocumentLock::new());
        let read = lock.read();
        let acquired = Arc::new(AtomicBool::new(false));

        let writer = {
            let lock = Arc::clone(&lock);
            let acquired = Arc::clone(&acquired);
            std::thread::spawn(move || {
                let _write = lock.write().unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));

        // a nested read on a thread that already reads is not blocked by the waiting writer
        let nested = lock.read();
        drop(nested);
        drop(read);
        writer.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }
}
