//! Insertion into the paragraph tree.
//!
//! The insert runs after the new text is already in the content, so the
//! leaf covering the edit point has grown to include it. The buffer then
//! walks down to that leaf, pushing one frame per branch, and folds the
//! directives in: content runs become leaves, paragraph boundaries pop or
//! push frames, and the part of the tree right of the insertion is
//! "fractured" (recreated) when the directives open new branches.

use super::directive::{Directive, DirectiveKind, JoinMode};
use crate::attributes::{AttributeContext, AttributeSet};
use crate::content::GapContent;
use crate::element::{Element, ElementEdit, names};
use crate::event::structural_fault;

/// Pending change to one branch's children.
#[derive(Debug)]
pub(super) struct Frame {
    pub(super) parent: Element,
    pub(super) index: usize,
    pub(super) added: Vec<Element>,
    pub(super) removed: Vec<Element>,
    pub(super) is_fracture: bool,
}

/// Single-use tree editor for one edit.
pub(crate) struct ElementBuffer<'a> {
    pub(super) root: Element,
    pub(super) content: &'a mut GapContent,
    pub(super) context: &'a AttributeContext,
    pub(super) offset: usize,
    pub(super) length: usize,
    pub(super) end_offset: usize,
    pub(super) pos: usize,
    /// Frame arena; `path`, `changes` and `insert_path` index into it.
    pub(super) frames: Vec<Frame>,
    pub(super) path: Vec<usize>,
    pub(super) changes: Vec<usize>,
    insert_path: Vec<usize>,
    created_fracture: bool,
    fractured_parent: Option<Element>,
    fractured_child: Option<Element>,
    offset_last_index: bool,
    offset_last_index_on_replace: bool,
    recreate_leaves: bool,
}

impl<'a> ElementBuffer<'a> {
    pub(crate) fn new(root: &Element, content: &'a mut GapContent, context: &'a AttributeContext) -> Self {
        Self {
            root: root.clone(),
            content,
            context,
            offset: 0,
            length: 0,
            end_offset: 0,
            pos: 0,
            frames: Vec::new(),
            path: Vec::new(),
            changes: Vec::new(),
            insert_path: Vec::new(),
            created_fracture: false,
            fractured_parent: None,
            fractured_child: None,
            offset_last_index: false,
            offset_last_index_on_replace: false,
            recreate_leaves: false,
        }
    }

    /// Restructure for `length` chars inserted at `offset`, as described by `data`.
    pub(crate) fn insert(mut self, offset: usize, length: usize, data: &[Directive]) -> Vec<ElementEdit> {
        if length == 0 || data.is_empty() {
            return Vec::new();
        }
        self.begin_edits(offset, length);
        self.insert_update(data);
        self.end_edits()
    }

    pub(super) fn begin_edits(&mut self, offset: usize, length: usize) {
        self.offset = offset;
        self.length = length;
        self.end_offset = offset + length;
        self.pos = offset;
    }

    /// Splice every recorded change into the tree.
    pub(super) fn end_edits(&mut self) -> Vec<ElementEdit> {
        let mut edits = Vec::with_capacity(self.changes.len());
        for &id in &self.changes {
            let frame = &mut self.frames[id];
            let removed = std::mem::take(&mut frame.removed);
            let added = std::mem::take(&mut frame.added);
            frame
                .parent
                .replace(frame.index, removed.len(), added.clone());
            edits.push(ElementEdit::new(
                frame.parent.clone(),
                frame.index,
                removed,
                added,
            ));
        }
        self.changes.clear();
        self.path.clear();
        edits
    }

    pub(super) fn push(&mut self, parent: &Element, index: usize, is_fracture: bool) -> usize {
        let id = self.frames.len();
        self.frames.push(Frame {
            parent: parent.clone(),
            index,
            added: Vec::new(),
            removed: Vec::new(),
            is_fracture,
        });
        self.path.push(id);
        id
    }

    pub(super) fn pop(&mut self) {
        let Some(id) = self.path.pop() else {
            structural_fault("end of paragraph with no open paragraph");
        };
        let frame = &self.frames[id];
        if !frame.added.is_empty() || !frame.removed.is_empty() {
            self.changes.push(id);
        } else if let Some(&top) = self.path.last() {
            if frame.parent.element_count() == 0 {
                // an unused branch pushed by a start directive is not added after all
                let unused = frame.parent.clone();
                let added = &mut self.frames[top].added;
                if let Some(at) = added.iter().position(|e| e.ptr_eq(&unused)) {
                    added.remove(at);
                }
            }
        }
    }

    pub(super) fn top(&self) -> usize {
        match self.path.last() {
            Some(&id) => id,
            None => structural_fault("directive with no open branch"),
        }
    }

    pub(super) fn child_at(parent: &Element, index: usize) -> Element {
        parent.child(index).unwrap_or_else(|| {
            structural_fault(&format!(
                "{parent} has no child at {index} of {}",
                parent.element_count()
            ))
        })
    }

    pub(super) fn create_leaf(&mut self, parent: &Element, attributes: &AttributeSet, p0: usize, p1: usize) -> Element {
        let start = self.position(p0);
        let end = self.position(p1);
        Element::new_leaf(
            Some(parent),
            names::CONTENT,
            self.context.canonical(attributes),
            start,
            end,
        )
    }

    pub(super) fn create_branch(&self, parent: &Element, attributes: &AttributeSet) -> Element {
        Element::new_branch(
            Some(parent),
            names::PARAGRAPH,
            self.context.canonical(attributes),
        )
    }

    fn position(&mut self, offset: usize) -> crate::content::Position {
        self.content
            .create_position(offset)
            .unwrap_or_else(|e| structural_fault(&format!("leaf bound {offset}: {e}")))
    }

    /// Copy of `clonee` under `parent`, with fresh positions.
    pub(super) fn clone_element(&mut self, parent: &Element, clonee: &Element) -> Element {
        if clonee.is_leaf() {
            return self.create_leaf(
                parent,
                &clonee.attributes(),
                clonee.start_offset(),
                clonee.end_offset(),
            );
        }
        let copy = self.create_branch(parent, &clonee.attributes());
        let children = clonee
            .children()
            .iter()
            .map(|child| self.clone_element(&copy, child))
            .collect();
        copy.replace(0, 0, children);
        copy
    }

    fn insert_update(&mut self, data: &[Directive]) {
        let mut elem = self.root.clone();
        let mut index = elem.element_index(self.offset);
        while !elem.is_leaf() {
            let child = Self::child_at(&elem, index);
            let at = if child.is_leaf() { index } else { index + 1 };
            self.push(&elem, at, false);
            elem = child;
            index = elem.element_index(self.offset);
        }

        self.insert_path = self.path.clone();
        self.created_fracture = false;
        self.recreate_leaves = false;

        let first_is_content = data[0].kind() == DirectiveKind::Content;
        let rest = if first_is_content {
            self.insert_first_content(data);
            self.pos += data[0].length();
            &data[1..]
        } else {
            self.fracture_deepest_leaf();
            data
        };
        for directive in rest {
            self.insert_element(directive);
        }

        if !self.created_fracture {
            self.fracture(None);
        }
        while !self.path.is_empty() {
            self.pop();
        }

        if self.offset_last_index && self.offset_last_index_on_replace {
            if let Some(&last) = self.insert_path.last() {
                self.frames[last].index += 1;
            }
        }

        // every branch on the original path with a change gets an edit
        for k in (0..self.insert_path.len()).rev() {
            let id = self.insert_path[k];
            let is_fractured_parent = self
                .fractured_parent
                .as_ref()
                .is_some_and(|p| p.ptr_eq(&self.frames[id].parent));
            if is_fractured_parent {
                if let Some(child) = self.fractured_child.clone() {
                    self.frames[id].added.push(child);
                }
            }
            let frame = &self.frames[id];
            if (!frame.added.is_empty() || !frame.removed.is_empty()) && !self.changes.contains(&id) {
                self.changes.push(id);
            }
        }

        // an insert at 0 starting with end directives leaves the first
        // recreated branch empty; drop it
        if self.offset == 0 && self.fractured_parent.is_some() && data[0].kind() == DirectiveKind::EndParagraph {
            let ends = data
                .iter()
                .take_while(|d| d.kind() == DirectiveKind::EndParagraph)
                .count();
            let Some(k) = self.insert_path.len().checked_sub(ends + 1) else {
                structural_fault("more end directives than open branches");
            };
            let id = self.insert_path[k];
            let frame = &mut self.frames[id];
            frame.index = frame.index.saturating_sub(1);
            let empty = Self::child_at(&frame.parent, frame.index);
            frame.removed.insert(0, empty);
        }
    }

    fn insert_first_content(&mut self, data: &[Directive]) {
        let first = &data[0];
        let id = self.top();
        let parent = self.frames[id].parent.clone();
        let index = self.frames[id].index;
        let child = Self::child_at(&parent, index);
        let first_end = self.offset + first.length();
        let only_content = data.len() == 1;

        match first.join() {
            JoinMode::JoinPrevious => {
                if child.end_offset() != first_end && !only_content {
                    let head = self.create_leaf(&parent, &child.attributes(), child.start_offset(), first_end);
                    self.frames[id].added.push(head);
                    self.frames[id].removed.push(child.clone());
                    if child.end_offset() == self.end_offset {
                        self.offset_last_index = true;
                    } else {
                        self.recreate_leaves = true;
                    }
                } else {
                    self.offset_last_index = true;
                    self.offset_last_index_on_replace = true;
                }
            }
            JoinMode::JoinNext => {
                if self.offset != 0 {
                    let head = self.create_leaf(&parent, &child.attributes(), child.start_offset(), self.offset);
                    self.frames[id].added.push(head);
                    let next = Self::child_at(&parent, index + 1);
                    let end = if only_content { next.end_offset() } else { first_end };
                    let merged = self.create_leaf(&parent, &next.attributes(), self.offset, end);
                    let frame = &mut self.frames[id];
                    frame.added.push(merged);
                    frame.removed.push(child);
                    frame.removed.push(next);
                }
            }
            JoinMode::Originate | JoinMode::Fracture => {
                if child.start_offset() != self.offset {
                    let head = self.create_leaf(&parent, &child.attributes(), child.start_offset(), self.offset);
                    self.frames[id].added.push(head);
                }
                self.frames[id].removed.push(child.clone());
                let run = self.create_leaf(&parent, first.attributes(), self.offset, first_end);
                self.frames[id].added.push(run);
                if child.end_offset() == self.end_offset {
                    self.offset_last_index = true;
                } else {
                    self.recreate_leaves = true;
                }
            }
        }
    }

    /// The insert starts with a paragraph boundary: split the leaf at the edit point.
    fn fracture_deepest_leaf(&mut self) {
        let id = self.top();
        let parent = self.frames[id].parent.clone();
        let child = Self::child_at(&parent, self.frames[id].index);
        if self.offset != 0 {
            let head = self.create_leaf(&parent, &child.attributes(), child.start_offset(), self.offset);
            self.frames[id].added.push(head);
        }
        if child.end_offset() == self.end_offset {
            self.offset_last_index = true;
        } else {
            self.recreate_leaves = true;
        }
        self.frames[id].removed.push(child);
    }

    fn insert_element(&mut self, directive: &Directive) {
        let id = self.top();
        let parent = self.frames[id].parent.clone();
        let index = self.frames[id].index;

        match directive.kind() {
            DirectiveKind::StartParagraph => match directive.join() {
                JoinMode::JoinNext => {
                    let mut next = Self::child_at(&parent, index);
                    if next.is_leaf() {
                        if index + 1 < parent.element_count() {
                            next = Self::child_at(&parent, index + 1);
                        } else {
                            structural_fault("join next to a leaf");
                        }
                    }
                    // treated as a fracture so that a following join-next run lands in it
                    self.push(&next, 0, true);
                }
                JoinMode::Fracture => {
                    if !self.created_fracture {
                        self.fracture(Some(self.path.len() - 1));
                    }
                    let target = if self.frames[id].is_fracture {
                        Self::child_at(&parent, 0)
                    } else {
                        match self.fractured_child.clone() {
                            Some(child) => child,
                            None => structural_fault("fracture directive with nothing fractured"),
                        }
                    };
                    self.push(&target, 0, true);
                }
                JoinMode::Originate | JoinMode::JoinPrevious => {
                    let branch = self.create_branch(&parent, directive.attributes());
                    self.frames[id].added.push(branch.clone());
                    self.push(&branch, 0, false);
                }
            },
            DirectiveKind::EndParagraph => self.pop(),
            DirectiveKind::Content => {
                let len = directive.length();
                if directive.join() != JoinMode::JoinNext {
                    let leaf = self.create_leaf(&parent, directive.attributes(), self.pos, self.pos + len);
                    self.frames[id].added.push(leaf);
                } else {
                    let first = if self.frames[id].is_fracture {
                        Self::child_at(&parent, 0)
                    } else {
                        let on_insert_path = self.insert_path.iter().rposition(|&f| f == id);
                        match on_insert_path {
                            Some(k) if k != self.insert_path.len() - 1 => Self::child_at(&parent, index),
                            _ => Self::child_at(&parent, index + 1),
                        }
                    };
                    let leaf = self.create_leaf(&parent, &first.attributes(), self.pos, first.end_offset());
                    self.frames[id].added.push(leaf);
                    self.frames[id].removed.push(first);
                }
                self.pos += len;
            }
        }
    }

    /// Decide whether the elements right of the insertion must be recreated,
    /// and from which depth.
    fn fracture(&mut self, depth: Option<usize>) {
        let c_length = self.insert_path.len();
        let Some(&last_change) = self.insert_path.last() else {
            structural_fault("fracture with an empty insert path");
        };
        let mut last_index = None;
        let mut need_recreate = self.recreate_leaves;
        let last = &self.frames[last_change];
        let mut child_altered = last.index + 1 < last.parent.element_count();
        let mut deepest_altered_index = need_recreate.then_some(c_length);
        let mut last_altered_index = c_length - 1;

        self.created_fracture = true;
        for counter in (0..c_length.saturating_sub(1)).rev() {
            let change = &self.frames[self.insert_path[counter]];
            if !change.added.is_empty() || Some(counter) == depth {
                last_index = Some(counter);
                if !need_recreate && child_altered {
                    need_recreate = true;
                    deepest_altered_index.get_or_insert(last_altered_index + 1);
                }
            }
            if !child_altered && change.index < change.parent.element_count() {
                child_altered = true;
                last_altered_index = counter;
            }
        }
        if need_recreate {
            let start = last_index.unwrap_or(c_length - 1);
            self.fracture_from(start, deepest_altered_index.unwrap_or(c_length));
        }
    }

    /// Recreate everything right of the insertion point from `start_index`
    /// down to `end_fracture_index` on the insert path.
    fn fracture_from(&mut self, mut start_index: usize, end_fracture_index: usize) {
        let change_length = self.insert_path.len();
        let id = self.insert_path[start_index];
        let change_parent = self.frames[id].parent.clone();
        let change_index = self.frames[id].index;

        let child = if start_index + 1 == change_length {
            Self::child_at(&change_parent, change_index)
        } else {
            Self::child_at(&change_parent, change_index.saturating_sub(1))
        };
        let new_child = self.recreate_head(&change_parent, &child);
        self.fractured_parent = Some(change_parent);
        self.fractured_child = Some(new_child.clone());

        let mut parent = new_child;
        loop {
            start_index += 1;
            if start_index >= end_fracture_index {
                break;
            }
            let is_end = start_index + 1 == end_fracture_index;
            let is_end_leaf = start_index + 1 == change_length;
            let id = self.insert_path[start_index];
            let change_parent = self.frames[id].parent.clone();
            let change_index = self.frames[id].index;

            let child = if is_end {
                (!self.offset_last_index && is_end_leaf)
                    .then(|| Self::child_at(&change_parent, change_index))
            } else {
                Some(Self::child_at(&change_parent, change_index.saturating_sub(1)))
            };
            let new_child = child.map(|child| self.recreate_head(&parent, &child));

            let mut kids_to_move = change_parent.element_count().saturating_sub(change_index);
            let mut kids = Vec::new();
            let mut move_start = match &new_child {
                None if is_end_leaf => {
                    kids_to_move = kids_to_move.saturating_sub(1);
                    change_index + 1
                }
                None => change_index,
                Some(head) => {
                    kids.push(head.clone());
                    if is_end {
                        change_index + 1
                    } else {
                        kids_to_move += 1;
                        change_index
                    }
                }
            };
            for _ in kids.len()..kids_to_move {
                let to_move = Self::child_at(&change_parent, move_start);
                move_start += 1;
                let copy = self.recreate_fractured_element(&parent, &to_move);
                kids.push(copy);
                self.frames[id].removed.push(to_move);
            }
            parent.replace(0, 0, kids);
            match new_child {
                Some(child) => parent = child,
                None => break,
            }
        }
    }

    /// Right half of `child`: a leaf clipped to start at the insert end, or an empty branch.
    fn recreate_head(&mut self, parent: &Element, child: &Element) -> Element {
        if child.is_leaf() {
            self.create_leaf(
                parent,
                &child.attributes(),
                self.end_offset.max(child.start_offset()),
                child.end_offset(),
            )
        } else {
            self.create_branch(parent, &child.attributes())
        }
    }

    fn recreate_fractured_element(&mut self, parent: &Element, to_duplicate: &Element) -> Element {
        if to_duplicate.is_leaf() {
            return self.create_leaf(
                parent,
                &to_duplicate.attributes(),
                to_duplicate.start_offset().max(self.end_offset),
                to_duplicate.end_offset(),
            );
        }
        let copy = self.create_branch(parent, &to_duplicate.attributes());
        let kids = to_duplicate
            .children()
            .iter()
            .map(|kid| self.recreate_fractured_element(&copy, kid))
            .collect();
        copy.replace(0, 0, kids);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::keys;

    struct Fixture {
        content: GapContent,
        context: AttributeContext,
        root: Element,
    }

    /// `section > paragraph > content [0,1)` over an empty document.
    fn fixture() -> Fixture {
        let mut content = GapContent::new();
        let context = AttributeContext::new();
        let root = Element::new_branch(None, names::SECTION, AttributeSet::empty());
        let para = Element::new_branch(Some(&root), names::PARAGRAPH, AttributeSet::empty());
        let leaf = Element::new_leaf(
            Some(&para),
            names::CONTENT,
            AttributeSet::empty(),
            content.create_position(0).unwrap(),
            content.create_position(1).unwrap(),
        );
        para.replace(0, 0, vec![leaf]);
        root.replace(0, 0, vec![para]);
        Fixture {
            content,
            context,
            root,
        }
    }

    impl Fixture {
        fn insert(&mut self, offset: usize, text: &str, data: &[Directive]) -> Vec<ElementEdit> {
            self.content.insert_string(offset, text).unwrap();
            let len = text.chars().count();
            ElementBuffer::new(&self.root, &mut self.content, &self.context).insert(offset, len, data)
        }
    }

    fn bold() -> AttributeSet {
        AttributeSet::builder().with(keys::BOLD, true).build()
    }

    #[test]
    fn joining_run_needs_no_edit() {
        let mut f = fixture();
        let data = [Directive::run(AttributeSet::empty(), 2).with_join(JoinMode::JoinPrevious)];
        let edits = f.insert(0, "ab", &data);
        assert!(edits.is_empty());
        assert_eq!(
            f.root.dump(),
            "section [0,3)\n  paragraph [0,3)\n    content [0,3)\n"
        );
    }

    #[test]
    fn new_run_splits_the_leaf() {
        let mut f = fixture();
        let edits = f.insert(0, "ab", &[Directive::run(bold(), 2)]);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].children_removed().len(), 1);
        assert_eq!(edits[0].children_added().len(), 2);
        assert_eq!(
            f.root.dump(),
            "section [0,3)\n  paragraph [0,3)\n    content [0,2) {bold=true}\n    content [2,3)\n"
        );
    }

    #[test]
    fn line_break_fractures_the_paragraph() {
        let mut f = fixture();
        let data = [Directive::run(AttributeSet::empty(), 4).with_join(JoinMode::JoinPrevious)];
        f.insert(0, "abcd", &data);

        let data = [
            Directive::run(AttributeSet::empty(), 1).with_join(JoinMode::JoinPrevious),
            Directive::end_paragraph(),
            Directive::start_paragraph(AttributeSet::empty()).with_join(JoinMode::Fracture),
        ];
        let edits = f.insert(2, "\n", &data);
        assert_eq!(edits.len(), 2);
        assert_eq!(
            f.root.dump(),
            "section [0,6)\n  paragraph [0,3)\n    content [0,3)\n  paragraph [3,6)\n    content [3,6)\n"
        );
    }

    #[test]
    fn undoing_insert_edits_restores_the_tree() {
        let mut f = fixture();
        let before = f.root.dump();
        let edits = f.insert(0, "ab", &[Directive::run(bold(), 2)]);
        for edit in edits.iter().rev() {
            edit.undo();
        }
        f.content.remove(0, 2).unwrap();
        assert_eq!(f.root.dump(), before);
    }

    #[test]
    #[should_panic(expected = "structural inconsistency")]
    fn unbalanced_end_directive_panics() {
        let mut f = fixture();
        let data = [
            Directive::run(AttributeSet::empty(), 1),
            Directive::end_paragraph(),
            Directive::end_paragraph(),
            Directive::end_paragraph(),
        ];
        f.insert(0, "a", &data);
    }
}
