//! Undo records for content changes.

use super::gap::GapContent;
use super::position::SavedMark;
use crate::error::Result;

/// Whether a [`ContentEdit`] recorded an insertion or a removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentEditKind {
    Insert,
    Remove,
}

/// Inverse of one content change.
///
/// Removed text is kept so undo does not replay the forward operation. The
/// positions inside the affected range are captured when text leaves the
/// buffer and put back at their exact offsets when it returns.
#[derive(Clone, Debug)]
pub struct ContentEdit {
    kind: ContentEditKind,
    offset: usize,
    length: usize,
    /// Text currently out of the buffer, if any.
    text: Option<String>,
    saved: Vec<SavedMark>,
}

impl ContentEdit {
    pub(crate) fn inserted(offset: usize, length: usize) -> Self {
        Self {
            kind: ContentEditKind::Insert,
            offset,
            length,
            text: None,
            saved: Vec::new(),
        }
    }

    pub(crate) fn removed(offset: usize, text: String, saved: Vec<SavedMark>) -> Self {
        Self {
            kind: ContentEditKind::Remove,
            offset,
            length: text.chars().count(),
            text: Some(text),
            saved,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ContentEditKind {
        self.kind
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Text held by the record while it is out of the buffer.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub(crate) fn undo(&mut self, content: &mut GapContent) -> Result<()> {
        match self.kind {
            ContentEditKind::Insert => self.take_out(content),
            ContentEditKind::Remove => self.put_back(content),
        }
    }

    pub(crate) fn redo(&mut self, content: &mut GapContent) -> Result<()> {
        match self.kind {
            ContentEditKind::Insert => self.put_back(content),
            ContentEditKind::Remove => self.take_out(content),
        }
    }

    fn take_out(&mut self, content: &mut GapContent) -> Result<()> {
        self.saved = content.marks_in_range(self.offset, self.length);
        self.text = Some(content.close_range(self.offset, self.length)?);
        Ok(())
    }

    fn put_back(&mut self, content: &mut GapContent) -> Result<()> {
        let text = self.text.take().unwrap_or_default();
        let chars: Vec<char> = text.chars().collect();
        content.insert_chars(self.offset, &chars)?;
        let saved = std::mem::take(&mut self.saved);
        content.restore_marks(&saved, self.offset, self.length);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_undo_redo_keeps_text_and_positions() {
        let mut c = GapContent::new();
        c.insert_string(0, "abc").unwrap();
        let mut edit = c.insert_string(1, "XYZ").unwrap();
        let inside = c.create_position(2).unwrap();
        let end = c.create_position(4).unwrap();
        assert_eq!(edit.kind(), ContentEditKind::Insert);

        edit.undo(&mut c).unwrap();
        assert_eq!(c.text(0, c.len()).unwrap(), "abc\n");
        assert_eq!(edit.text(), Some("XYZ"));
        assert_eq!(inside.offset(), 1);

        edit.redo(&mut c).unwrap();
        assert_eq!(c.text(0, c.len()).unwrap(), "aXYZbc\n");
        assert_eq!(inside.offset(), 2);
        assert_eq!(end.offset(), 4);
        assert!(edit.text().is_none());
    }

    #[test]
    fn remove_record_holds_removed_text() {
        let mut c = GapContent::new();
        c.insert_string(0, "hello").unwrap();
        let edit = c.remove(1, 3).unwrap();
        assert_eq!(edit.kind(), ContentEditKind::Remove);
        assert_eq!(edit.text(), Some("ell"));
        assert_eq!((edit.offset(), edit.length()), (1, 3));
    }
}
