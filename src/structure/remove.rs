//! Removal from the paragraph tree.
//!
//! Runs before the chars leave the content, while every leaf bound still
//! points at the text being removed. Elements fully inside the range are
//! dropped; when the range spans two siblings that can be merged (leaves
//! with equal attributes, or branches with equal names) they are replaced
//! by one joined copy.

use super::element_buffer::ElementBuffer;
use crate::element::{Element, ElementEdit};
use crate::event::structural_fault;

impl ElementBuffer<'_> {
    /// Restructure for `length` chars about to be removed at `offset`.
    pub(crate) fn remove(mut self, offset: usize, length: usize) -> Vec<ElementEdit> {
        self.begin_edits(offset, length);
        let root = self.root.clone();
        self.remove_elements(&root, offset, offset + length);
        self.end_edits()
    }

    /// Returns true when `elem` is left with no children.
    fn remove_elements(&mut self, elem: &Element, rm0: usize, rm1: usize) -> bool {
        if elem.is_leaf() {
            return false;
        }
        let index0 = elem.element_index(rm0);
        let index1 = elem.element_index(rm1);
        let id = self.push(elem, index0, false);

        if index0 == index1 {
            let child0 = Self::child_at(elem, index0);
            if (rm0 <= child0.start_offset() && rm1 >= child0.end_offset())
                || self.remove_elements(&child0, rm0, rm1)
            {
                self.frames[id].removed.push(child0);
            }
        } else {
            let mut child0 = Some(Self::child_at(elem, index0));
            let mut child1 = Some(Self::child_at(elem, index1));
            let contains_end = rm1 < elem.end_offset();
            if contains_end && Self::can_join(child0.as_ref(), child1.as_ref()) {
                for i in index0..=index1 {
                    let child = Self::child_at(elem, i);
                    self.frames[id].removed.push(child);
                }
                let (Some(left), Some(right)) = (child0, child1) else {
                    unreachable!("can_join checked both sides");
                };
                let joined = self.join(elem, &left, &right, rm0, rm1);
                self.frames[id].added.push(joined);
            } else {
                // drop the interior, then recurse into the ends
                let mut rindex0 = index0 + 1;
                let mut rindex1 = index1 as isize - 1;
                if let Some(first) = &child0 {
                    if first.start_offset() == rm0
                        || (index0 == 0 && first.start_offset() > rm0 && first.end_offset() <= rm1)
                    {
                        child0 = None;
                        rindex0 = index0;
                    }
                }
                if !contains_end {
                    child1 = None;
                    rindex1 += 1;
                } else if child1.as_ref().is_some_and(|c| c.start_offset() == rm1) {
                    child1 = None;
                }
                let rindex1 = usize::try_from(rindex1).ok();
                if let Some(last) = rindex1.filter(|&last| rindex0 <= last) {
                    self.frames[id].index = rindex0;
                    for i in rindex0..=last {
                        let child = Self::child_at(elem, i);
                        self.frames[id].removed.push(child);
                    }
                }
                if let Some(first) = child0 {
                    if self.remove_elements(&first, rm0, rm1) {
                        let frame = &mut self.frames[id];
                        frame.removed.insert(0, first);
                        frame.index = index0;
                    }
                }
                if let Some(last) = child1 {
                    if self.remove_elements(&last, rm0, rm1) {
                        self.frames[id].removed.push(last);
                    }
                }
            }
        }

        self.pop();

        let frame = &self.frames[id];
        frame.removed.len() >= frame.added.len()
            && elem.element_count() == frame.removed.len() - frame.added.len()
    }

    /// Leaves join when their attributes match; branches when their names do.
    fn can_join(e0: Option<&Element>, e1: Option<&Element>) -> bool {
        let (Some(e0), Some(e1)) = (e0, e1) else {
            return false;
        };
        match (e0.is_leaf(), e1.is_leaf()) {
            (true, true) => e0.attributes() == e1.attributes(),
            (false, false) => e0.name() == e1.name(),
            _ => false,
        }
    }

    fn join(&mut self, parent: &Element, left: &Element, right: &Element, rm0: usize, rm1: usize) -> Element {
        match (left.is_leaf(), right.is_leaf()) {
            (true, true) => self.create_leaf(
                parent,
                &left.attributes(),
                left.start_offset(),
                right.end_offset(),
            ),
            (false, false) => {
                let to = self.create_branch(parent, &left.attributes());
                let lj_index = left.element_index(rm0);
                let rj_index = right.element_index(rm1);
                let lj = Self::child_at(left, lj_index);
                let lj = (lj.start_offset() < rm0).then_some(lj);
                let rj = Self::child_at(right, rj_index);
                let rj = (rj.start_offset() != rm1).then_some(rj);

                let mut children = Vec::new();
                for i in 0..lj_index {
                    let child = Self::child_at(left, i);
                    children.push(self.clone_element(&to, &child));
                }
                if Self::can_join(lj.as_ref(), rj.as_ref()) {
                    if let (Some(lj), Some(rj)) = (&lj, &rj) {
                        children.push(self.join(&to, lj, rj, rm0, rm1));
                    }
                } else {
                    if let Some(lj) = &lj {
                        children.push(self.clone_as_necessary(&to, lj, rm0, rm1));
                    }
                    if let Some(rj) = &rj {
                        children.push(self.clone_as_necessary(&to, rj, rm0, rm1));
                    }
                }
                let first_right = if rj.is_none() { rj_index } else { rj_index + 1 };
                for i in first_right..right.element_count() {
                    let child = Self::child_at(right, i);
                    children.push(self.clone_element(&to, &child));
                }
                to.replace(0, 0, children);
                to
            }
            _ => structural_fault("cannot join a leaf with a branch"),
        }
    }

    /// Copy of `clonee` without the descendants that lie inside the removal.
    fn clone_as_necessary(&mut self, parent: &Element, clonee: &Element, rm0: usize, rm1: usize) -> Element {
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
            .filter(|child| child.start_offset() < rm0 || child.end_offset() > rm1)
            .map(|child| self.clone_as_necessary(&copy, child, rm0, rm1))
            .collect();
        copy.replace(0, 0, children);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Directive, JoinMode};
    use super::*;
    use crate::attributes::{AttributeContext, AttributeSet, keys};
    use crate::content::GapContent;
    use crate::element::names;

    struct Fixture {
        content: GapContent,
        context: AttributeContext,
        root: Element,
    }

    fn fixture() -> Fixture {
        let mut content = GapContent::new();
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
            context: AttributeContext::new(),
            root,
        }
    }

    impl Fixture {
        fn insert(&mut self, offset: usize, text: &str, data: &[Directive]) {
            self.content.insert_string(offset, text).unwrap();
            let len = text.chars().count();
            ElementBuffer::new(&self.root, &mut self.content, &self.context).insert(offset, len, data);
        }

        fn remove(&mut self, offset: usize, length: usize) -> Vec<ElementEdit> {
            let edits = ElementBuffer::new(&self.root, &mut self.content, &self.context).remove(offset, length);
            self.content.remove(offset, length).unwrap();
            edits
        }

        /// "ab\ncd\n" as two paragraphs.
        fn two_paragraphs(&mut self) {
            let plain = AttributeSet::empty;
            self.insert(0, "abcd", &[Directive::run(plain(), 4).with_join(JoinMode::JoinPrevious)]);
            self.insert(
                2,
                "\n",
                &[
                    Directive::run(plain(), 1).with_join(JoinMode::JoinPrevious),
                    Directive::end_paragraph(),
                    Directive::start_paragraph(plain()).with_join(JoinMode::Fracture),
                ],
            );
        }
    }

    #[test]
    fn removing_the_break_joins_paragraphs() {
        let mut f = fixture();
        f.two_paragraphs();
        let edits = f.remove(2, 1);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].children_removed().len(), 2);
        assert_eq!(edits[0].children_added().len(), 1);
        assert_eq!(
            f.root.dump(),
            "section [0,5)\n  paragraph [0,5)\n    content [0,2)\n    content [2,5)\n"
        );
    }

    #[test]
    fn removing_inside_a_leaf_changes_nothing_structural() {
        let mut f = fixture();
        f.insert(0, "abcd", &[Directive::run(AttributeSet::empty(), 4).with_join(JoinMode::JoinPrevious)]);
        assert!(f.remove(1, 2).is_empty());
        assert_eq!(
            f.root.dump(),
            "section [0,3)\n  paragraph [0,3)\n    content [0,3)\n"
        );
    }

    #[test]
    fn fully_covered_run_is_dropped() {
        let mut f = fixture();
        let bold = AttributeSet::builder().with(keys::BOLD, true).build();
        f.insert(0, "ab", &[Directive::run(bold, 2)]);
        let edits = f.remove(0, 2);
        assert_eq!(edits.len(), 1);
        assert_eq!(
            f.root.dump(),
            "section [0,1)\n  paragraph [0,1)\n    content [0,1)\n"
        );
    }

    #[test]
    fn mismatched_leaves_are_not_joined() {
        let plain = AttributeSet::empty();
        let bold = AttributeSet::builder().with(keys::BOLD, true).build();
        assert!(!ElementBuffer::can_join(None, None));

        let mut f = fixture();
        f.insert(0, "ab", &[Directive::run(bold, 2)]);
        let para = f.root.child(0).unwrap();
        let (left, right) = (para.child(0).unwrap(), para.child(1).unwrap());
        assert!(!ElementBuffer::can_join(Some(&left), Some(&right)));
        assert!(ElementBuffer::can_join(Some(&right), Some(&right)));
        assert!(!ElementBuffer::can_join(Some(&para), Some(&right)));
        assert_eq!(right.attributes(), plain);
    }
}
