//! Splitting leaves so a char range is covered by whole leaves.

use super::element_buffer::ElementBuffer;
use crate::element::ElementEdit;

impl ElementBuffer<'_> {
    /// Split leaves at `offset` and `offset + length` so the range can take
    /// its own attributes.
    pub(crate) fn change(mut self, offset: usize, length: usize) -> Vec<ElementEdit> {
        self.begin_edits(offset, length);
        if !self.split(offset, length) {
            while !self.path.is_empty() {
                self.pop();
            }
            self.split(offset + length, 0);
        }
        while !self.path.is_empty() {
            self.pop();
        }
        self.end_edits()
    }

    /// Split the leaf containing `offset`. Returns true when the far end of
    /// the range was handled too.
    fn split(&mut self, offset: usize, length: usize) -> bool {
        let mut elem = self.root.clone();
        let mut index = elem.element_index(offset);
        while !elem.is_leaf() {
            self.push(&elem, index, false);
            elem = Self::child_at(&elem, index);
            index = elem.element_index(offset);
        }

        let id = self.top();
        let parent = self.frames[id].parent.clone();
        let index0 = self.frames[id].index;
        let child = Self::child_at(&parent, index0);
        if offset <= child.start_offset() || offset >= child.end_offset() {
            return false;
        }

        let end = offset + length;
        let mut index1 = index0;
        let mut split_end = false;
        if end < parent.end_offset() && length != 0 {
            index1 = parent.element_index(end);
            if index1 == index0 {
                let attrs = child.attributes();
                let head = self.create_leaf(&parent, &attrs, child.start_offset(), offset);
                let middle = self.create_leaf(&parent, &attrs, offset, end);
                let tail = self.create_leaf(&parent, &attrs, end, child.end_offset());
                let frame = &mut self.frames[id];
                frame.removed.push(child);
                frame.added.extend([head, middle, tail]);
                return true;
            }
            if end == Self::child_at(&parent, index1).start_offset() {
                index1 = index0;
            }
            split_end = true;
        }

        self.split_leaf_at(id, index0, offset);
        for i in index0 + 1..index1 {
            let child = Self::child_at(&parent, i);
            let frame = &mut self.frames[id];
            frame.removed.push(child.clone());
            frame.added.push(child);
        }
        if index1 != index0 {
            self.split_leaf_at(id, index1, end);
        }
        split_end
    }

    fn split_leaf_at(&mut self, id: usize, index: usize, at: usize) {
        let parent = self.frames[id].parent.clone();
        let child = Self::child_at(&parent, index);
        let attrs = child.attributes();
        let head = self.create_leaf(&parent, &attrs, child.start_offset(), at);
        let tail = self.create_leaf(&parent, &attrs, at, child.end_offset());
        let frame = &mut self.frames[id];
        frame.removed.push(child);
        frame.added.extend([head, tail]);
    }
}
