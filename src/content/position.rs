//! Stable offsets that follow content edits.
//!
//! A [`Position`] holds a mark: a raw index into the gap buffer's backing
//! array. Its offset is derived by translating the raw index across the gap,
//! so moving the gap only touches the marks inside the moved region. The
//! [`MarkTable`] keeps marks sorted by raw index and owns one strong handle
//! per mark; a mark is live while any [`Position`] still references it.
//!
//! # Invariants
//!
//! - Marks are sorted by raw index at all times.
//! - A mark at raw index 0 is never adjusted: offset 0 stays 0.
//! - A mark logically at the gap start sits at the gap end, so an insert at
//!   its offset pushes it forward. Forward-biased marks are parked before the
//!   gap instead and stay put.

use std::fmt;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Which side of an insertion at its offset a position sticks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Bias {
    /// Stay before text inserted at this offset.
    Forward,
    /// Move past text inserted at this offset.
    #[default]
    Backward,
}

/// Gap bounds shared between the buffer and its positions.
#[derive(Debug, Default)]
pub(crate) struct GapBounds {
    start: AtomicUsize,
    end: AtomicUsize,
}

impl GapBounds {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        Self {
            start: AtomicUsize::new(start),
            end: AtomicUsize::new(end),
        }
    }

    pub(crate) fn start(&self) -> usize {
        self.start.load(Ordering::Acquire)
    }

    pub(crate) fn end(&self) -> usize {
        self.end.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, start: usize, end: usize) {
        self.start.store(start, Ordering::Release);
        self.end.store(end, Ordering::Release);
    }

    /// Translate a raw array index into a logical offset.
    pub(crate) fn offset_of(&self, index: usize) -> usize {
        let g0 = self.start();
        let g1 = self.end();
        if index < g0 {
            index
        } else {
            index.saturating_sub(g1 - g0)
        }
    }

    /// Translate a logical offset into the raw index a new mark should use.
    pub(crate) fn index_for(&self, offset: usize) -> usize {
        let g0 = self.start();
        let g1 = self.end();
        if offset < g0 || offset == 0 {
            offset
        } else {
            offset + (g1 - g0)
        }
    }
}

#[derive(Debug)]
pub(crate) struct Mark {
    index: AtomicUsize,
    bias: Bias,
}

impl Mark {
    pub(crate) fn index(&self) -> usize {
        self.index.load(Ordering::Acquire)
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.index.store(index, Ordering::Release);
    }

    pub(crate) const fn bias(&self) -> Bias {
        self.bias
    }
}

/// An offset into document content that tracks edits.
///
/// Inserting at or before the offset moves it forward by the inserted length
/// (unless the position is forward-biased and the insert lands exactly on
/// it). Removing a range containing the offset clamps it to the start of the
/// range. A position at offset 0 stays at 0.
#[derive(Clone)]
pub struct Position {
    mark: Arc<Mark>,
    gap: Arc<GapBounds>,
}

impl Position {
    /// Current offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.gap.offset_of(self.mark.index())
    }

    /// Bias this position was created with.
    #[must_use]
    pub fn bias(&self) -> Bias {
        self.mark.bias
    }

    /// True if both handles track the same mark.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mark, &other.mark)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.offset())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offset())
    }
}

/// Sorted table of marks owned by one gap buffer.
#[derive(Debug)]
pub(crate) struct MarkTable {
    marks: Vec<Arc<Mark>>,
    gap: Arc<GapBounds>,
}

impl MarkTable {
    pub(crate) fn new(gap: Arc<GapBounds>) -> Self {
        Self {
            marks: Vec::new(),
            gap,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.marks.len()
    }

    /// Marks whose last [`Position`] was dropped.
    pub(crate) fn unused(&self) -> usize {
        self.marks
            .iter()
            .filter(|m| Arc::strong_count(m) == 1)
            .count()
    }

    /// Drop marks no position references any more.
    pub(crate) fn purge(&mut self) -> usize {
        let before = self.marks.len();
        self.marks.retain(|m| Arc::strong_count(m) > 1);
        before - self.marks.len()
    }

    /// Position at `offset`, sharing an existing live mark at the same raw
    /// index and bias when there is one.
    pub(crate) fn create(&mut self, offset: usize, bias: Bias) -> Position {
        let index = self.gap.index_for(offset);
        let lower = self.marks.partition_point(|m| m.index() < index);
        let upper = self.marks.partition_point(|m| m.index() <= index);
        let shared = self.marks[lower..upper]
            .iter()
            .find(|m| m.bias == bias && Arc::strong_count(m) > 1)
            .cloned();
        let mark = shared.unwrap_or_else(|| {
            let mark = Arc::new(Mark {
                index: AtomicUsize::new(index),
                bias,
            });
            self.marks.insert(upper, Arc::clone(&mark));
            mark
        });
        Position {
            mark,
            gap: Arc::clone(&self.gap),
        }
    }

    /// First mark whose raw index is `>= max(search, 1)`.
    ///
    /// Marks at raw index 0 are pinned and never part of an adjustment.
    fn adjust_index(&self, search: usize) -> usize {
        let search = search.max(1);
        self.marks.partition_point(|m| m.index() < search)
    }

    /// Gap moved up: marks in `[old_gap_start, new_gap_end)` move down by the gap length.
    pub(crate) fn shift_gap_up(&self, old_gap_start: usize, new_gap_end: usize, gap_len: usize) {
        for mark in &self.marks[self.adjust_index(old_gap_start)..] {
            let index = mark.index();
            if index >= new_gap_end {
                break;
            }
            mark.set_index(index - gap_len);
        }
    }

    /// Gap moved down: marks in `[new_gap_start, old_gap_end)` move up by the gap length.
    pub(crate) fn shift_gap_down(&self, new_gap_start: usize, old_gap_end: usize, gap_len: usize) {
        for mark in &self.marks[self.adjust_index(new_gap_start)..] {
            let index = mark.index();
            if index >= old_gap_end {
                break;
            }
            mark.set_index(index + gap_len);
        }
    }

    /// The array grew; everything at or past the old gap end moves by `dg`.
    pub(crate) fn shift_end(&self, old_gap_end: usize, dg: usize) {
        for mark in &self.marks[self.adjust_index(old_gap_end)..] {
            mark.set_index(mark.index() + dg);
        }
    }

    /// The gap start moved down over removed text; marks in `[new_gap_start, gap_end]`
    /// land on the gap end.
    pub(crate) fn shift_gap_start_down(&self, new_gap_start: usize, gap_end: usize) {
        for mark in &self.marks[self.adjust_index(new_gap_start)..] {
            if mark.index() > gap_end {
                break;
            }
            mark.set_index(gap_end);
        }
    }

    /// The gap end moved up over removed text; marks in it land on the new end.
    pub(crate) fn shift_gap_end_up(&self, old_gap_end: usize, new_gap_end: usize) {
        for mark in &self.marks[self.adjust_index(old_gap_end)..] {
            if mark.index() >= new_gap_end {
                break;
            }
            mark.set_index(new_gap_end);
        }
    }

    /// With the gap at 0, every mark at offset 0 is pinned to raw index 0.
    pub(crate) fn reset_at_zero(&self, gap_start: usize, gap_end: usize) {
        if gap_start != 0 {
            return;
        }
        for mark in &self.marks {
            if mark.index() > gap_end {
                break;
            }
            mark.set_index(0);
        }
    }

    /// Park forward-biased marks sitting on the gap end just before the gap.
    ///
    /// Called right before text is written into the gap at `gap_start`.
    pub(crate) fn park_forward(&mut self, gap_start: usize, gap_end: usize) {
        if gap_start == 0 {
            return;
        }
        let from = self.marks.partition_point(|m| m.index() < gap_end);
        let to = self.marks.partition_point(|m| m.index() <= gap_end);
        if from == to {
            return;
        }
        let run = &mut self.marks[from..to];
        run.sort_by_key(|m| m.bias() == Bias::Backward);
        for mark in run.iter() {
            if mark.bias() == Bias::Forward {
                mark.set_index(gap_start);
            }
        }
    }

    /// Live marks whose offset falls in `[offset, offset + length]`, with that offset.
    pub(crate) fn in_range(&self, offset: usize, length: usize) -> Vec<SavedMark> {
        let end = offset + length;
        let from = self
            .marks
            .partition_point(|m| self.gap.offset_of(m.index()) < offset);
        let to = self
            .marks
            .partition_point(|m| self.gap.offset_of(m.index()) <= end);
        self.marks[from..to.max(from)]
            .iter()
            .filter(|m| Arc::strong_count(m) > 1)
            .map(|m| SavedMark {
                mark: Arc::downgrade(m),
                offset: self.gap.offset_of(m.index()),
            })
            .collect()
    }

    /// Restore marks captured by [`in_range`](Self::in_range) once the text
    /// `[offset, offset + length)` is back and the gap sits right after it.
    pub(crate) fn restore(&mut self, saved: &[SavedMark], offset: usize, length: usize) {
        let end = offset + length;
        let (g0, g1) = (self.gap.start(), self.gap.end());
        for entry in saved {
            let Some(mark) = entry.mark.upgrade() else {
                continue;
            };
            if entry.offset == end {
                mark.set_index(g1);
            } else {
                mark.set_index(entry.offset);
            }
        }
        self.marks.sort_by_key(|m| m.index());
        self.reset_at_zero(g0, g1);
    }
}

/// A mark captured by a content edit, with the offset it had at capture time.
#[derive(Clone, Debug)]
pub(crate) struct SavedMark {
    mark: Weak<Mark>,
    offset: usize,
}
