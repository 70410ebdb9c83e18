//! Directives for plain text typed into the paragraph tree.
//!
//! Every `'\n'` in the inserted text closes the current paragraph and opens
//! a new one carrying the paragraph attributes. The join modes are chosen so
//! that typing inside a run extends it, a line break fractures the paragraph
//! it lands in, and text matching the following run joins it.

use crate::attributes::AttributeSet;
use crate::element::Element;
use crate::structure::{Directive, DirectiveKind, JoinMode};

/// Where the insert lands, sampled after the text is in the content but
/// before the tree is updated.
pub(crate) struct InsertSite<'a> {
    pub(crate) root: &'a Element,
    pub(crate) offset: usize,
    pub(crate) text: &'a str,
    /// Char just before `offset`, if any.
    pub(crate) previous: Option<char>,
    /// Document length including the inserted text.
    pub(crate) doc_len: usize,
}

pub(crate) fn directives_for_insert(site: &InsertSite<'_>, attributes: &AttributeSet) -> Vec<Directive> {
    let length = site.text.chars().count();
    let offset = site.offset;
    let end_offset = offset + length;
    let Some(paragraph) = site.root.paragraph_at(end_offset) else {
        return Vec::new();
    };
    let Some(p_paragraph) = site.root.paragraph_at(offset) else {
        return Vec::new();
    };
    let run = site.root.leaf_at(offset);
    let at_boundary = run.end_offset() == end_offset;
    let run_attributes = run.attributes();

    let mut directives = Vec::new();
    let mut last_start: Option<usize> = None;
    let mut last_start_join = JoinMode::Originate;
    let after_newline = site.previous == Some('\n');
    let mut paragraph_attributes = paragraph.attributes();
    if after_newline {
        last_start_join = after_newline_directives(
            &paragraph,
            &p_paragraph,
            &paragraph_attributes,
            &mut directives,
            offset,
            end_offset,
        );
        last_start = directives
            .iter()
            .rposition(|d| d.kind() == DirectiveKind::StartParagraph);
    } else {
        paragraph_attributes = p_paragraph.attributes();
    }

    let mut pending = 0;
    for ch in site.text.chars() {
        pending += 1;
        if ch == '\n' {
            directives.push(Directive::run(attributes.clone(), pending));
            directives.push(Directive::end_paragraph());
            directives.push(Directive::start_paragraph(paragraph_attributes.clone()));
            last_start = Some(directives.len() - 1);
            pending = 0;
        }
    }
    if pending > 0 {
        directives.push(Directive::run(attributes.clone(), pending));
    }

    if let Some(first) = directives.first_mut() {
        if first.kind() == DirectiveKind::Content && run_attributes == *attributes {
            first.set_join(JoinMode::JoinPrevious);
        }
    }

    if let Some(i) = last_start {
        let join = if after_newline {
            Some(last_start_join)
        } else if p_paragraph.end_offset() != end_offset {
            Some(JoinMode::Fracture)
        } else {
            next_is_branch(&p_paragraph, offset).then_some(JoinMode::JoinNext)
        };
        if let Some(join) = join {
            directives[i].set_join(join);
        }
    }
    let last_start_join = last_start.map(|i| directives[i].join());

    let joins_next_leaf = |directives: &[Directive]| {
        directives.last().is_some_and(|last| {
            last.kind() == DirectiveKind::Content && last.join() != JoinMode::JoinPrevious
        })
    };
    if at_boundary && end_offset < site.doc_len {
        let structure_allows = match last_start_join {
            None => paragraph.ptr_eq(&p_paragraph) || after_newline,
            Some(join) => join != JoinMode::Originate,
        };
        if joins_next_leaf(&directives) && structure_allows {
            let next_run = paragraph.child(paragraph.element_index(end_offset));
            if next_run.is_some_and(|next| next.is_leaf() && next.attributes() == *attributes) {
                if let Some(last) = directives.last_mut() {
                    last.set_join(JoinMode::JoinNext);
                }
            }
        }
    } else if !at_boundary
        && last_start_join == Some(JoinMode::Fracture)
        && joins_next_leaf(&directives)
        && *attributes == run_attributes
    {
        if let Some(last) = directives.last_mut() {
            last.set_join(JoinMode::JoinNext);
        }
    }
    directives
}

/// True if the sibling after the paragraph holding `offset` is a branch.
fn next_is_branch(p_paragraph: &Element, offset: usize) -> bool {
    p_paragraph.parent().is_some_and(|parent| {
        let index = parent.element_index(offset);
        parent.child(index + 1).is_some_and(|next| !next.is_leaf())
    })
}

/// Close and reopen paragraphs for text typed right after a line break.
/// Returns the join mode for the last opened paragraph.
fn after_newline_directives(
    paragraph: &Element,
    p_paragraph: &Element,
    paragraph_attributes: &AttributeSet,
    directives: &mut Vec<Directive>,
    offset: usize,
    end_offset: usize,
) -> JoinMode {
    let same_parent = match (paragraph.parent(), p_paragraph.parent()) {
        (Some(a), Some(b)) => a.ptr_eq(&b),
        (None, None) => true,
        _ => false,
    };
    if same_parent {
        directives.push(Directive::end_paragraph());
        directives.push(Directive::start_paragraph(paragraph_attributes.clone()));
        if p_paragraph.end_offset() != end_offset {
            return JoinMode::Fracture;
        }
        let has_next = p_paragraph.parent().is_some_and(|parent| {
            parent.element_index(offset) + 1 < parent.element_count()
        });
        return if has_next {
            JoinMode::JoinNext
        } else {
            JoinMode::Originate
        };
    }

    // deeper trees: close up to the common ancestor, then open down the right side
    let mut left_parents: Vec<Element> = Vec::new();
    let mut cursor = Some(p_paragraph.clone());
    while let Some(e) = cursor {
        cursor = e.parent();
        left_parents.push(e);
    }
    let mut right_parents: Vec<Element> = Vec::new();
    let mut cursor = Some(paragraph.clone());
    while let Some(e) = cursor {
        if let Some(left_index) = left_parents.iter().position(|l| l.ptr_eq(&e)) {
            for _ in 0..left_index {
                directives.push(Directive::end_paragraph());
            }
            for (counter, right) in right_parents.iter().enumerate().rev() {
                let mut start = Directive::start_paragraph(right.attributes());
                if counter > 0 {
                    start.set_join(JoinMode::JoinNext);
                }
                directives.push(start);
            }
            return if right_parents.is_empty() {
                JoinMode::Fracture
            } else {
                JoinMode::JoinNext
            };
        }
        cursor = e.parent();
        right_parents.push(e);
    }
    JoinMode::Originate
}
