//! Event and log callback system.
//!
//! Embedders can install a process-wide log callback and an event callback.
//! Log records are also forwarded to [`tracing`], so a `tracing` subscriber
//! sees the same diagnostics without installing a callback.

use std::sync::{Mutex, OnceLock, PoisonError};

/// Log level for debug callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

type EventCallback = Box<dyn Fn(&str, &str) + Send + Sync + 'static>;
type LogCallback = Box<dyn Fn(LogLevel, &str) + Send + Sync + 'static>;

fn event_callback() -> &'static Mutex<Option<EventCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<EventCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

fn log_callback() -> &'static Mutex<Option<LogCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<LogCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

/// Set the global event callback.
pub fn set_event_callback<F>(callback: F)
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    let mut guard = event_callback()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Box::new(callback));
}

/// Remove the global event callback.
pub fn clear_event_callback() {
    let mut guard = event_callback()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = None;
}

/// Emit an event to the registered callback.
pub fn emit_event(name: &str, data: &str) {
    tracing::trace!(target: "docmodel::event", name, data);
    if let Ok(guard) = event_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(name, data);
        }
    }
}

/// Set the global log callback.
pub fn set_log_callback<F>(callback: F)
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    let mut guard = log_callback().lock().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Box::new(callback));
}

/// Remove the global log callback.
pub fn clear_log_callback() {
    let mut guard = log_callback().lock().unwrap_or_else(PoisonError::into_inner);
    *guard = None;
}

/// Emit a log record to `tracing` and the registered callback.
pub fn emit_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!(target: "docmodel", "{message}"),
        LogLevel::Info => tracing::info!(target: "docmodel", "{message}"),
        LogLevel::Warn => tracing::warn!(target: "docmodel", "{message}"),
        LogLevel::Error => tracing::error!(target: "docmodel", "{message}"),
    }
    if let Ok(guard) = log_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(level, message);
        }
    }
}

/// Report a broken tree invariant and abort the current operation.
///
/// The tree may already be mid-mutation, so there is no recovery path.
#[track_caller]
pub(crate) fn structural_fault(message: &str) -> ! {
    emit_log(LogLevel::Error, message);
    panic!("structural inconsistency: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_event_callback() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = Arc::clone(&called);
        set_event_callback(move |name, _data| {
            if name == "test.event_callback" {
                called_clone.store(true, Ordering::SeqCst);
            }
        });
        emit_event("test.event_callback", "{}");
        assert!(called.load(Ordering::SeqCst));
        clear_event_callback();
    }

    #[test]
    fn test_log_callback() {
        let seen = Arc::new(AtomicBool::new(false));
        let seen_clone = Arc::clone(&seen);
        set_log_callback(move |level, msg| {
            if msg == "hello from test_log_callback" {
                assert_eq!(level, LogLevel::Info);
                seen_clone.store(true, Ordering::SeqCst);
            }
        });
        emit_log(LogLevel::Info, "hello from test_log_callback");
        assert!(seen.load(Ordering::SeqCst));
        clear_log_callback();
    }

    #[test]
    #[should_panic(expected = "structural inconsistency")]
    fn test_structural_fault_panics() {
        structural_fault("unbalanced end directive");
    }
}
