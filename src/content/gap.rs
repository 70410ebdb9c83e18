//! Gap buffer content store.
//!
//! Characters live in one array with a movable unused region (the gap).
//! Edits move the gap to the edit point, so typing near a cursor only copies
//! the chars between the previous and the current edit point.
//!
//! # Invariants
//!
//! - `g0 <= g1 <= array.len()`; live text is `array[..g0] ++ array[g1..]`.
//! - The content always ends with one `'\n'` that can never be removed.
//! - Every gap move, growth or removal re-homes the marks inside the moved
//!   region before returning.

use super::edit::ContentEdit;
use super::position::{Bias, GapBounds, MarkTable, Position, SavedMark};
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log};
use std::fmt;
use std::sync::Arc;

/// Default number of chars allocated for a new buffer.
pub const DEFAULT_INITIAL_CAPACITY: usize = 10;

/// Minimum number of dead marks tolerated before a purge.
const MIN_UNUSED_MARKS: usize = 5;

/// Character storage with a gap and live position tracking.
pub struct GapContent {
    array: Vec<char>,
    g0: usize,
    g1: usize,
    gap: Arc<GapBounds>,
    marks: MarkTable,
    created_since_purge: usize,
}

impl GapContent {
    /// Create a buffer holding only the implicit terminal line break.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Create a buffer with room for `capacity` chars before the first growth.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let gap = Arc::new(GapBounds::new(0, capacity));
        let mut content = Self {
            array: vec!['\0'; capacity],
            g0: 0,
            g1: capacity,
            marks: MarkTable::new(Arc::clone(&gap)),
            gap,
            created_since_purge: 0,
        };
        content.array[0] = '\n';
        content.set_gap(1, capacity);
        content
    }

    /// Number of chars, including the implicit terminal line break.
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len() - (self.g1 - self.g0)
    }

    /// Always false: the terminal line break is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Allocated capacity of the backing array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.array.len()
    }

    /// Number of marks currently tracked, live or not.
    #[must_use]
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Insert `text` at `offset` (`0 <= offset < len()`).
    pub fn insert_string(&mut self, offset: usize, text: &str) -> Result<ContentEdit> {
        if offset >= self.len() {
            return Err(Error::bad_offset(offset, 0, self.len() - 1));
        }
        let chars: Vec<char> = text.chars().collect();
        self.insert_chars(offset, &chars)?;
        Ok(ContentEdit::inserted(offset, chars.len()))
    }

    /// Remove `length` chars at `offset`. The terminal line break cannot be removed.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<ContentEdit> {
        if offset + length >= self.len() {
            return Err(Error::bad_offset(offset, length, self.len() - 1));
        }
        let removed = self.text(offset, length)?;
        let saved = self.marks.in_range(offset, length);
        self.close(offset, length);
        Ok(ContentEdit::removed(offset, removed, saved))
    }

    /// Copy out `length` chars starting at `offset`.
    pub fn text(&self, offset: usize, length: usize) -> Result<String> {
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= self.len())
            .ok_or_else(|| Error::bad_offset(offset, length, self.len()))?;
        let mut out = String::with_capacity(length);
        if end <= self.g0 {
            out.extend(&self.array[offset..end]);
        } else if offset >= self.g0 {
            let gap_len = self.g1 - self.g0;
            out.extend(&self.array[offset + gap_len..end + gap_len]);
        } else {
            out.extend(&self.array[offset..self.g0]);
            out.extend(&self.array[self.g1..self.g1 + (end - self.g0)]);
        }
        Ok(out)
    }

    /// The char at `offset`, if in range.
    #[must_use]
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.len() {
            return None;
        }
        let index = if offset < self.g0 {
            offset
        } else {
            offset + (self.g1 - self.g0)
        };
        Some(self.array[index])
    }

    /// Create a backward-biased position at `offset` (`0 <= offset <= len()`).
    pub fn create_position(&mut self, offset: usize) -> Result<Position> {
        self.create_position_with_bias(offset, Bias::Backward)
    }

    /// Create a position at `offset` with an explicit bias.
    pub fn create_position_with_bias(&mut self, offset: usize, bias: Bias) -> Result<Position> {
        if offset > self.len() {
            return Err(Error::bad_offset(offset, 0, self.len()));
        }
        self.purge_if_needed();
        Ok(self.marks.create(offset, bias))
    }

    pub(crate) fn insert_chars(&mut self, offset: usize, chars: &[char]) -> Result<()> {
        if chars.is_empty() {
            return Ok(());
        }
        let at = self.open(offset, chars.len())?;
        self.array[at..at + chars.len()].copy_from_slice(chars);
        Ok(())
    }

    pub(crate) fn marks_in_range(&self, offset: usize, length: usize) -> Vec<SavedMark> {
        self.marks.in_range(offset, length)
    }

    pub(crate) fn restore_marks(&mut self, saved: &[SavedMark], offset: usize, length: usize) {
        self.marks.restore(saved, offset, length);
    }

    /// Remove without the terminal-line-break guard; used when undoing inserts.
    pub(crate) fn close_range(&mut self, offset: usize, length: usize) -> Result<String> {
        let removed = self.text(offset, length)?;
        self.close(offset, length);
        Ok(removed)
    }

    fn set_gap(&mut self, g0: usize, g1: usize) {
        self.g0 = g0;
        self.g1 = g1;
        self.gap.set(g0, g1);
    }

    fn purge_if_needed(&mut self) {
        self.created_since_purge += 1;
        let threshold = MIN_UNUSED_MARKS.max(self.marks.len() / 10);
        if self.created_since_purge <= threshold {
            return;
        }
        self.created_since_purge = 0;
        if self.marks.unused() > threshold {
            let purged = self.marks.purge();
            emit_log(
                LogLevel::Debug,
                &format!("purged {purged} unused marks, {} remain", self.marks.len()),
            );
        }
    }

    /// Make room for `n` chars at `position`; returns where to write them.
    fn open(&mut self, position: usize, n: usize) -> Result<usize> {
        self.shift_gap(position);
        if n >= self.g1 - self.g0 {
            let needed = self.len() + n;
            self.shift_end(needed)?;
        }
        self.marks.park_forward(self.g0, self.g1);
        self.set_gap(self.g0 + n, self.g1);
        Ok(position)
    }

    /// Fold `n` chars at `position` into the gap.
    fn close(&mut self, position: usize, n: usize) {
        if n == 0 {
            return;
        }
        let end = position + n;
        let new_gap_end = (self.g1 - self.g0) + end;
        if end <= self.g0 {
            if self.g0 != end {
                self.shift_gap(end);
            }
            self.shift_gap_start_down(self.g0 - n);
        } else if position >= self.g0 {
            if self.g0 != position {
                self.shift_gap(position);
            }
            self.shift_gap_end_up(self.g1 + n);
        } else {
            self.shift_gap_start_down(position);
            self.shift_gap_end_up(new_gap_end);
        }
    }

    fn shift_gap(&mut self, new_gap_start: usize) {
        let old_gap_start = self.g0;
        if new_gap_start == old_gap_start {
            return;
        }
        let old_gap_end = self.g1;
        let gap_len = old_gap_end - old_gap_start;
        let new_gap_end = new_gap_start + gap_len;

        if new_gap_start > old_gap_start {
            let dg = new_gap_start - old_gap_start;
            self.array
                .copy_within(old_gap_end..old_gap_end + dg, old_gap_start);
            self.set_gap(new_gap_start, new_gap_end);
            self.marks
                .shift_gap_up(old_gap_start, new_gap_end, gap_len);
        } else {
            self.array
                .copy_within(new_gap_start..old_gap_start, new_gap_end);
            self.set_gap(new_gap_start, new_gap_end);
            self.marks
                .shift_gap_down(new_gap_start, old_gap_end, gap_len);
        }
        self.marks.reset_at_zero(self.g0, self.g1);
    }

    fn shift_end(&mut self, new_size: usize) -> Result<()> {
        let old_size = self.array.len();
        let old_gap_end = self.g1;
        let upper = old_size - old_gap_end;
        let array_len = (new_size + 1) * 2;
        let new_gap_end = array_len - upper;

        self.array.try_reserve_exact(array_len - old_size)?;
        self.array.resize(array_len, '\0');
        if upper != 0 {
            self.array
                .copy_within(old_gap_end..old_size, new_gap_end);
        }
        self.set_gap(self.g0, new_gap_end);
        self.marks.shift_end(old_gap_end, new_gap_end - old_gap_end);
        emit_log(
            LogLevel::Debug,
            &format!("content grew from {old_size} to {array_len} chars"),
        );
        Ok(())
    }

    fn shift_gap_start_down(&mut self, new_gap_start: usize) {
        self.marks.shift_gap_start_down(new_gap_start, self.g1);
        self.set_gap(new_gap_start, self.g1);
        self.marks.reset_at_zero(self.g0, self.g1);
    }

    fn shift_gap_end_up(&mut self, new_gap_end: usize) {
        self.marks.shift_gap_end_up(self.g1, new_gap_end);
        self.set_gap(self.g0, new_gap_end);
        self.marks.reset_at_zero(self.g0, self.g1);
    }
}

impl Default for GapContent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GapContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapContent")
            .field("len", &self.len())
            .field("gap", &(self.g0..self.g1))
            .field("marks", &self.marks.len())
            .finish()
    }
}
