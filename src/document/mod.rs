//! The observable document.
//!
//! A [`Document`] owns the gap buffer, the paragraph tree and the bidi tree
//! and keeps them consistent across edits. Every mutation is one transaction
//! under the write lock:
//!
//! 1. validate offsets (nothing is touched on failure)
//! 2. change the content and restructure the paragraph tree
//! 3. resegment bidi runs once right-to-left text has been seen
//! 4. notify document listeners, then undoable-edit listeners
//!
//! Listener failures do not stop the fan-out. They are collected and returned
//! as [`Error::Listeners`] after the transaction is committed.
//!
//! # Examples
//!
//! ```
//! use docmodel::Document;
//!
//! let doc = Document::new();
//! doc.insert_string(0, "hello\nworld", None).unwrap();
//! assert_eq!(doc.len(), 11);
//! assert_eq!(doc.root_element().element_count(), 2);
//! assert_eq!(doc.text(6, 5).unwrap(), "world");
//! ```

mod config;
mod event;
mod listener;
mod lock;
mod typed_text;

pub use config::{DEFAULT_EDIT_LOOKUP_THRESHOLD, DocumentConfig};
pub use event::{DocumentEvent, EventKind};
pub use listener::{DocumentListener, UndoableEditListener};

use crate::attributes::{AttributeBuilder, AttributeContext, AttributeSet, keys};
use crate::bidi::segmenter::{self, BidiSegmenter};
use crate::bidi::{BidiAnalyzer, Direction, needs_bidi};
use crate::content::{Bias, GapContent, Position};
use crate::element::{AttributeEdit, Element, names};
use crate::error::{Error, ListenerError, Result};
use crate::event::{LogLevel, emit_event, emit_log, structural_fault};
use crate::structure::{Directive, ElementBuffer};
use bitflags::bitflags;
use event::UndoRecord;
use lock::DocumentLock;
use typed_text::InsertSite;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

bitflags! {
    /// Document-wide facts that only ever turn on.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct DocumentFlags: u8 {
        /// Right-to-left text or an explicit run direction was seen; bidi
        /// runs are maintained from now on.
        const HAS_BIDI  = 0x01;
        /// Text outside Latin-1 was inserted.
        const MULTIBYTE = 0x02;
    }
}

/// Name of the style every new paragraph resolves through.
pub const DEFAULT_STYLE_NAME: &str = "default";

pub(crate) struct DocumentInner {
    pub(crate) lock: DocumentLock,
    content: Mutex<GapContent>,
    root: Element,
    bidi_root: Element,
    default_style: AttributeSet,
    context: Arc<AttributeContext>,
    analyzer: Arc<dyn BidiAnalyzer>,
    run_direction: Option<Direction>,
    edit_lookup_threshold: usize,
    flags: AtomicU8,
    listeners: Mutex<Vec<Arc<dyn DocumentListener>>>,
    undo_listeners: Mutex<Vec<Arc<dyn UndoableEditListener>>>,
}

impl DocumentInner {
    pub(crate) fn content(&self) -> MutexGuard<'_, GapContent> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flags(&self) -> DocumentFlags {
        DocumentFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    fn set_flag(&self, flag: DocumentFlags) {
        self.flags.fetch_or(flag.bits(), Ordering::AcqRel);
    }

    fn enable_bidi(&self, reason: &str) {
        if !self.flags().contains(DocumentFlags::HAS_BIDI) {
            self.set_flag(DocumentFlags::HAS_BIDI);
            emit_log(LogLevel::Info, &format!("bidi segmentation enabled: {reason}"));
        }
    }

    /// Resegment the paragraphs spanning `[offset, offset + length]`.
    fn update_bidi(&self, content: &mut GapContent, event: &DocumentEvent, offset: usize, length: usize) {
        let segmenter = BidiSegmenter {
            bidi_root: &self.bidi_root,
            paragraphs: &self.root,
            content,
            context: &self.context,
            analyzer: self.analyzer.as_ref(),
            default_direction: self.run_direction,
        };
        let range = segmenter.affected(offset, length);
        let edit = segmenter.update(range);
        event.push(UndoRecord::Element(edit));
    }

    /// Put `text` into the content and the paragraph tree.
    fn insert_text(
        &self,
        content: &mut GapContent,
        event: &DocumentEvent,
        offset: usize,
        text: &str,
        attributes: Option<&AttributeSet>,
    ) -> Result<()> {
        let edit = content.insert_string(offset, text)?;
        event.push(UndoRecord::Content(edit));
        if needs_bidi(text) {
            self.enable_bidi("right-to-left text inserted");
        }

        let attributes = attributes.map_or_else(|| self.context.empty(), |a| self.context.canonical(a));
        let previous = offset.checked_sub(1).and_then(|p| content.char_at(p));
        let site = InsertSite {
            root: &self.root,
            offset,
            text,
            previous,
            doc_len: content.len() - 1,
        };
        let directives = typed_text::directives_for_insert(&site, &attributes);
        let length = text.chars().count();
        let edits = ElementBuffer::new(&self.root, content, &self.context).insert(offset, length, &directives);
        event.push_element_edits(edits);

        if text.chars().any(|ch| u32::from(ch) > 0xFF) {
            self.set_flag(DocumentFlags::MULTIBYTE);
        }
        Ok(())
    }

    /// Take `[offset, offset + length)` out of the paragraph tree and the content.
    fn remove_text(&self, content: &mut GapContent, event: &DocumentEvent, offset: usize, length: usize) -> Result<()> {
        let edits = ElementBuffer::new(&self.root, content, &self.context).remove(offset, length);
        event.push_element_edits(edits);
        let edit = content.remove(offset, length)?;
        event.push(UndoRecord::Content(edit));
        Ok(())
    }

    fn replace_text(
        &self,
        content: &mut GapContent,
        event: &DocumentEvent,
        offset: usize,
        length: usize,
        text: &str,
        attributes: Option<&AttributeSet>,
    ) -> Result<()> {
        if length > 0 {
            self.remove_text(content, event, offset, length)?;
        }
        if !text.is_empty() {
            self.insert_text(content, event, offset, text, attributes)?;
        }
        Ok(())
    }

    fn notify_document_listeners(&self, event: &DocumentEvent, errors: &mut Vec<ListenerError>) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let _notifying = self.lock.notifying();
        for listener in listeners {
            if let Err(e) = listener.changed(event) {
                emit_log(LogLevel::Error, &format!("document listener failed: {e}"));
                errors.push(e);
            }
        }
    }

    fn notify_undo_listeners(&self, event: &DocumentEvent, errors: &mut Vec<ListenerError>) {
        let listeners = self
            .undo_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let _notifying = self.lock.notifying();
        for listener in listeners {
            if let Err(e) = listener.undoable_edit_happened(event) {
                emit_log(LogLevel::Error, &format!("undoable edit listener failed: {e}"));
                errors.push(e);
            }
        }
    }

    pub(crate) fn fire_document_listeners(&self, event: &DocumentEvent) -> Result<()> {
        let mut errors = Vec::new();
        self.notify_document_listeners(event, &mut errors);
        listener_result(errors)
    }

    /// Commit `event` and tell everyone.
    fn publish(&self, event: &DocumentEvent) -> Result<()> {
        event.end();
        let name = match event.kind() {
            EventKind::Insert => "document.insert",
            EventKind::Remove => "document.remove",
            EventKind::Change => "document.change",
        };
        emit_event(
            name,
            &format!("offset={} length={}", event.offset(), event.length()),
        );
        let mut errors = Vec::new();
        self.notify_document_listeners(event, &mut errors);
        self.notify_undo_listeners(event, &mut errors);
        listener_result(errors)
    }
}

fn listener_result(errors: Vec<ListenerError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Listeners(errors))
    }
}

/// A styled, observable text document.
///
/// Cloning is cheap and yields another handle to the same document. All
/// methods are safe to call from several threads: queries take the read
/// lock, edits take the write lock.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// An empty document: one section holding one paragraph holding one
    /// leaf over the implicit line break.
    #[must_use]
    pub fn with_config(config: DocumentConfig) -> Self {
        let context = config.attribute_context;
        let mut content = GapContent::with_capacity(config.initial_capacity);
        let default_style = context.intern(
            AttributeBuilder::new().with(keys::NAME, DEFAULT_STYLE_NAME),
        );

        let root = Element::new_branch(None, names::SECTION, context.empty());
        let paragraph = Element::new_branch(
            Some(&root),
            names::PARAGRAPH,
            context.with_resolve_parent(&context.empty(), Some(default_style.clone())),
        );
        let (start, end) = match (content.create_position(0), content.create_position(1)) {
            (Ok(start), Ok(end)) => (start, end),
            (Err(e), _) | (_, Err(e)) => structural_fault(&format!("initial leaf: {e}")),
        };
        let leaf = Element::new_leaf(Some(&paragraph), names::CONTENT, context.empty(), start, end);
        paragraph.replace(0, 0, vec![leaf]);
        root.replace(0, 0, vec![paragraph]);
        let bidi_root = segmenter::initial_root(&mut content, &context, 1);

        let inner = Arc::new(DocumentInner {
            lock: DocumentLock::new(),
            content: Mutex::new(content),
            root,
            bidi_root,
            default_style,
            context,
            analyzer: config.bidi_analyzer,
            run_direction: config.run_direction,
            edit_lookup_threshold: config.edit_lookup_threshold,
            flags: AtomicU8::new(0),
            listeners: Mutex::new(Vec::new()),
            undo_listeners: Mutex::new(Vec::new()),
        });
        if inner.run_direction == Some(Direction::Rtl) {
            inner.set_flag(DocumentFlags::HAS_BIDI);
            let mut content = inner.content();
            let segmenter = BidiSegmenter {
                bidi_root: &inner.bidi_root,
                paragraphs: &inner.root,
                content: &mut content,
                context: &inner.context,
                analyzer: inner.analyzer.as_ref(),
                default_direction: inner.run_direction,
            };
            segmenter.update(0..1);
        }
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<DocumentInner>) -> Self {
        Self { inner }
    }

    /// Number of chars, not counting the implicit trailing line break.
    #[must_use]
    pub fn len(&self) -> usize {
        let _read = self.inner.lock.read();
        self.inner.content().len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn flags(&self) -> DocumentFlags {
        self.inner.flags()
    }

    /// `length` chars starting at `offset`. The implicit line break may be included.
    pub fn text(&self, offset: usize, length: usize) -> Result<String> {
        let _read = self.inner.lock.read();
        self.inner.content().text(offset, length)
    }

    pub fn text_range(&self, range: Range<usize>) -> Result<String> {
        if range.end < range.start {
            return Err(Error::bad_offset(range.start, 0, self.len()));
        }
        self.text(range.start, range.len())
    }

    /// The whole text without the implicit line break.
    #[must_use]
    pub fn contents(&self) -> String {
        let _read = self.inner.lock.read();
        let content = self.inner.content();
        content.text(0, content.len() - 1).unwrap_or_default()
    }

    /// Fail unless `[offset, offset + length)` lies within the text.
    fn check_range(&self, offset: usize, length: usize) -> Result<()> {
        let _read = self.inner.lock.read();
        let doc_len = self.inner.content().len() - 1;
        if offset.checked_add(length).is_none_or(|end| end > doc_len) {
            return Err(Error::bad_offset(offset, length, doc_len));
        }
        Ok(())
    }

    /// Insert `text` at `offset` with character `attributes` (none means plain).
    ///
    /// Returns the committed event, or `None` if `text` is empty.
    pub fn insert_string(
        &self,
        offset: usize,
        text: &str,
        attributes: Option<&AttributeSet>,
    ) -> Result<Option<DocumentEvent>> {
        if text.is_empty() {
            self.check_range(offset, 0)?;
            return Ok(None);
        }
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let length = text.chars().count();
        let event = DocumentEvent::new(inner, EventKind::Insert, offset, length, inner.edit_lookup_threshold);
        {
            let mut content = inner.content();
            if offset >= content.len() {
                return Err(Error::bad_offset(offset, 0, content.len() - 1));
            }
            inner.insert_text(&mut content, &event, offset, text, attributes)?;
            if inner.flags().contains(DocumentFlags::HAS_BIDI) {
                inner.update_bidi(&mut content, &event, offset, length);
            }
        }
        inner.publish(&event).map(|()| Some(event))
    }

    /// Insert text together with the structure `directives` describe.
    ///
    /// The inserted text is the concatenation of the content directives'
    /// text. Paragraph boundaries come from the directives, not from line
    /// breaks in the text.
    pub fn insert_directives(&self, offset: usize, directives: &[Directive]) -> Result<Option<DocumentEvent>> {
        let text: String = directives.iter().filter_map(Directive::text).collect();
        if text.is_empty() {
            self.check_range(offset, 0)?;
            return Ok(None);
        }
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let length = text.chars().count();
        let event = DocumentEvent::new(inner, EventKind::Insert, offset, length, inner.edit_lookup_threshold);
        {
            let mut content = inner.content();
            if offset >= content.len() {
                return Err(Error::bad_offset(offset, 0, content.len() - 1));
            }
            let edit = content.insert_string(offset, &text)?;
            event.push(UndoRecord::Content(edit));
            if needs_bidi(&text) {
                inner.enable_bidi("right-to-left text inserted");
            }
            let edits = ElementBuffer::new(&inner.root, &mut content, &inner.context).insert(offset, length, directives);
            event.push_element_edits(edits);
            if inner.flags().contains(DocumentFlags::HAS_BIDI) {
                inner.update_bidi(&mut content, &event, offset, length);
            }
            if text.chars().any(|ch| u32::from(ch) > 0xFF) {
                inner.set_flag(DocumentFlags::MULTIBYTE);
            }
        }
        inner.publish(&event).map(|()| Some(event))
    }

    /// Remove `length` chars at `offset`. The implicit line break cannot be removed.
    ///
    /// Returns the committed event, or `None` if `length` is zero.
    pub fn remove(&self, offset: usize, length: usize) -> Result<Option<DocumentEvent>> {
        if length == 0 {
            self.check_range(offset, 0)?;
            return Ok(None);
        }
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let event = DocumentEvent::new(inner, EventKind::Remove, offset, length, inner.edit_lookup_threshold);
        {
            let mut content = inner.content();
            let doc_len = content.len() - 1;
            if offset.checked_add(length).is_none_or(|end| end > doc_len) {
                return Err(Error::bad_offset(offset, length, doc_len));
            }
            inner.remove_text(&mut content, &event, offset, length)?;
            if inner.flags().contains(DocumentFlags::HAS_BIDI) {
                inner.update_bidi(&mut content, &event, offset, 0);
            }
        }
        inner.publish(&event).map(|()| Some(event))
    }

    /// Remove `length` chars at `offset` and insert `text` there, as one
    /// transaction.
    ///
    /// The event is an insert of `text` (a removal if `text` is empty) whose
    /// records also hold the removed text; see
    /// [`DocumentEvent::content_changes`]. Undoing it restores the original
    /// text in one step.
    pub fn replace(
        &self,
        offset: usize,
        length: usize,
        text: &str,
        attributes: Option<&AttributeSet>,
    ) -> Result<Option<DocumentEvent>> {
        if length == 0 && text.is_empty() {
            self.check_range(offset, 0)?;
            return Ok(None);
        }
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let inserted = text.chars().count();
        let (kind, event_length) = if inserted > 0 {
            (EventKind::Insert, inserted)
        } else {
            (EventKind::Remove, length)
        };
        let event = DocumentEvent::new(inner, kind, offset, event_length, inner.edit_lookup_threshold);
        {
            let mut content = inner.content();
            let doc_len = content.len() - 1;
            if offset.checked_add(length).is_none_or(|end| end > doc_len) {
                return Err(Error::bad_offset(offset, length, doc_len));
            }
            if let Err(e) = inner.replace_text(&mut content, &event, offset, length, text, attributes) {
                event.abort(&mut content);
                return Err(e);
            }
            if inner.flags().contains(DocumentFlags::HAS_BIDI) {
                inner.update_bidi(&mut content, &event, offset, inserted);
            }
        }
        inner.publish(&event).map(|()| Some(event))
    }

    /// Apply `attributes` to the chars in `[offset, offset + length)`.
    ///
    /// Leaves straddling either end are split first. With `replace` each run
    /// takes exactly `attributes`; otherwise they are added to what it has.
    pub fn set_character_attributes(
        &self,
        offset: usize,
        length: usize,
        attributes: &AttributeSet,
        replace: bool,
    ) -> Result<Option<DocumentEvent>> {
        if length == 0 {
            self.check_range(offset, 0)?;
            return Ok(None);
        }
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let event = DocumentEvent::new(inner, EventKind::Change, offset, length, inner.edit_lookup_threshold);
        {
            let mut content = inner.content();
            let doc_len = content.len() - 1;
            if offset.checked_add(length).is_none_or(|end| end > doc_len) {
                return Err(Error::bad_offset(offset, length, doc_len));
            }
            let edits = ElementBuffer::new(&inner.root, &mut content, &inner.context).change(offset, length);
            event.push_element_edits(edits);
        }

        let end = offset + length;
        let mut pos = offset;
        while pos < end {
            let run = inner.root.leaf_at(pos);
            let last_end = run.end_offset();
            if pos == last_end {
                break;
            }
            let before = run.attributes();
            let after = if replace {
                inner.context.canonical(attributes)
            } else {
                inner.context.add_attributes(&before, attributes)
            };
            run.set_attributes(after.clone());
            event.push(UndoRecord::Attribute(AttributeEdit::new(run, before, after)));
            pos = last_end;
        }
        inner.publish(&event).map(|()| Some(event))
    }

    /// Apply `attributes` to every paragraph overlapping `[offset, offset + length)`.
    ///
    /// With `replace` each paragraph takes exactly `attributes`, keeping its
    /// logical style unless `attributes` brings its own. Setting a run
    /// direction turns bidi tracking on and resegments the paragraphs.
    pub fn set_paragraph_attributes(
        &self,
        offset: usize,
        length: usize,
        attributes: &AttributeSet,
        replace: bool,
    ) -> Result<DocumentEvent> {
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let event = DocumentEvent::new(inner, EventKind::Change, offset, length, inner.edit_lookup_threshold);
        let doc_len = inner.content().len() - 1;
        if offset.checked_add(length).is_none_or(|end| end > doc_len) {
            return Err(Error::bad_offset(offset, length, doc_len));
        }

        let section = &inner.root;
        let index0 = section.element_index(offset);
        let index1 = section.element_index(offset + length.saturating_sub(1));
        let mut has_runs = false;
        for i in index0..=index1 {
            let Some(paragraph) = section.child(i) else {
                break;
            };
            let before = paragraph.attributes();
            let after = if replace {
                let mut builder = AttributeBuilder::from_set(attributes);
                if attributes.resolve_parent().is_none() {
                    builder.set_resolve_parent(before.resolve_parent().cloned());
                }
                inner.context.intern(builder)
            } else {
                inner.context.add_attributes(&before, attributes)
            };
            has_runs |= after.run_direction().is_some();
            paragraph.set_attributes(after.clone());
            event.push(UndoRecord::Attribute(AttributeEdit::new(paragraph, before, after)));
        }
        if has_runs {
            inner.enable_bidi("paragraph run direction set");
            let mut content = inner.content();
            inner.update_bidi(&mut content, &event, offset, length);
            drop(content);
        }
        inner.publish(&event).map(|()| event)
    }

    /// Make `style` the resolve parent of the paragraph at `offset`.
    pub fn set_logical_style(&self, offset: usize, style: Option<&AttributeSet>) -> Result<DocumentEvent> {
        let inner = &self.inner;
        let _write = inner.lock.write()?;
        let paragraph = self.paragraph_at(offset)?;
        let before = paragraph.attributes();
        let after = inner
            .context
            .with_resolve_parent(&before, style.cloned());
        paragraph.set_attributes(after.clone());
        let range = paragraph.range();
        let event = DocumentEvent::new(
            inner,
            EventKind::Change,
            range.start,
            range.len(),
            inner.edit_lookup_threshold,
        );
        event.push(UndoRecord::Attribute(AttributeEdit::new(paragraph, before, after)));
        inner.publish(&event).map(|()| event)
    }

    /// Resolve parent of the paragraph at `offset`.
    pub fn logical_style(&self, offset: usize) -> Result<Option<AttributeSet>> {
        let _read = self.inner.lock.read();
        let paragraph = self.paragraph_at(offset)?;
        Ok(paragraph.attributes().resolve_parent().cloned())
    }

    /// The style new paragraphs resolve through.
    #[must_use]
    pub fn default_style(&self) -> AttributeSet {
        self.inner.default_style.clone()
    }

    fn paragraph_at(&self, offset: usize) -> Result<Element> {
        let limit = self.inner.content().len();
        if offset >= limit {
            return Err(Error::bad_offset(offset, 0, limit - 1));
        }
        Ok(self
            .inner
            .root
            .paragraph_at(offset)
            .unwrap_or_else(|| structural_fault(&format!("no paragraph at {offset}"))))
    }

    /// Backward-biased position at `offset` (`0 <= offset <= len() + 1`).
    pub fn create_position(&self, offset: usize) -> Result<Position> {
        self.create_position_with_bias(offset, Bias::Backward)
    }

    pub fn create_position_with_bias(&self, offset: usize, bias: Bias) -> Result<Position> {
        let _read = self.inner.lock.read();
        self.inner.content().create_position_with_bias(offset, bias)
    }

    /// Position pinned to the start of the document.
    pub fn start_position(&self) -> Result<Position> {
        self.create_position(0)
    }

    /// Position after the implicit line break; follows the end of the document.
    pub fn end_position(&self) -> Result<Position> {
        let _read = self.inner.lock.read();
        let mut content = self.inner.content();
        let end = content.len();
        content.create_position(end)
    }

    /// Root of the paragraph tree.
    #[must_use]
    pub fn root_element(&self) -> Element {
        self.inner.root.clone()
    }

    /// Root of the bidi run tree.
    #[must_use]
    pub fn bidi_root_element(&self) -> Element {
        self.inner.bidi_root.clone()
    }

    /// The paragraph containing `offset`. Offsets past the end map to the last paragraph.
    #[must_use]
    pub fn paragraph_element(&self, offset: usize) -> Element {
        let _read = self.inner.lock.read();
        self.inner
            .root
            .paragraph_at(offset)
            .unwrap_or_else(|| structural_fault(&format!("no paragraph at {offset}")))
    }

    /// The character run containing `offset`.
    #[must_use]
    pub fn character_element(&self, offset: usize) -> Element {
        let _read = self.inner.lock.read();
        self.inner.root.leaf_at(offset)
    }

    /// Run `f` with the read lock held, for consistent multi-step reads.
    pub fn render<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _read = self.inner.lock.read();
        f(self)
    }

    pub fn add_document_listener(&self, listener: Arc<dyn DocumentListener>) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Returns false if `listener` was not registered.
    pub fn remove_document_listener(&self, listener: &Arc<dyn DocumentListener>) -> bool {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn add_undoable_edit_listener(&self, listener: Arc<dyn UndoableEditListener>) {
        self.inner
            .undo_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Returns false if `listener` was not registered.
    pub fn remove_undoable_edit_listener(&self, listener: &Arc<dyn UndoableEditListener>) -> bool {
        let mut listeners = self
            .inner
            .undo_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// True if both handles refer to the same document.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.len())
            .field("flags", &self.flags())
            .field("paragraphs", &self.inner.root.element_count())
            .finish_non_exhaustive()
    }
}
