//! Capability interface of the host rich-text editor.
//!
//! This module provides:
//! - `HostEditor`, the minimal set of editor primitives the checker needs
//! - `Delta`/`Op`, the op-list document model those primitives exchange
//! - `MemoryEditor`, a complete in-memory host used when no UI is attached

mod delta;
mod memory;

use std::rc::Rc;

pub use delta::{Attributes, Delta, Insert, Op};
pub use memory::MemoryEditor;

/// Who caused a document change.
///
/// Only `User` changes may start the typing timer; everything the checker
/// does to the document is tagged `Silent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    User,
    Api,
    Silent,
}

/// A caret or range selection, in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    pub fn caret(index: usize) -> Self {
        Self::new(index, 0)
    }
}

/// Editor primitives consumed by the checker.
///
/// Methods take `&self`: the host owns the document and may keep changing it
/// (the user keeps typing) while a check request is in flight.
pub trait HostEditor {
    /// The whole document as an insert-only delta.
    fn contents(&self) -> Delta;

    /// Replace the whole document.
    fn set_contents(&self, contents: Delta, origin: ChangeOrigin);

    /// Apply a change delta.
    fn update_contents(&self, change: Delta, origin: ChangeOrigin);

    fn selection(&self) -> Option<Selection>;

    fn set_selection(&self, selection: Selection, origin: ChangeOrigin);

    /// Register a listener for content changes. Called once per change with
    /// the origin the change was tagged with.
    fn subscribe_changes(&self, listener: Box<dyn Fn(ChangeOrigin)>);

    fn delete_text(&self, index: usize, length: usize, origin: ChangeOrigin) {
        self.update_contents(Delta::new().retain(index).delete(length), origin);
    }

    fn insert_text(&self, index: usize, text: &str, origin: ChangeOrigin) {
        self.update_contents(Delta::new().retain(index).insert(text), origin);
    }

    /// Toggle whether the undo history records the following changes.
    fn set_history_ignore(&self, _ignore: bool) {}

    /// Serialized markup of the editing root, as the host renders it.
    fn root_html(&self) -> String;

    fn root_attribute(&self, name: &str) -> Option<String>;

    fn set_root_attribute(&self, name: &str, value: &str);

    /// Register a custom inline format with the host.
    fn register_inline_format(&self, _name: &str) {}

    /// Whether another instance of a LanguageTool checker (such as the
    /// browser extension toolbar) is already attached to the page.
    fn external_checker_attached(&self) -> bool {
        false
    }

    /// Show or hide the loading indicator widget.
    fn set_loading(&self, _loading: bool) {}
}

impl<T: HostEditor + ?Sized> HostEditor for Rc<T> {
    fn contents(&self) -> Delta {
        (**self).contents()
    }

    fn set_contents(&self, contents: Delta, origin: ChangeOrigin) {
        (**self).set_contents(contents, origin)
    }

    fn update_contents(&self, change: Delta, origin: ChangeOrigin) {
        (**self).update_contents(change, origin)
    }

    fn selection(&self) -> Option<Selection> {
        (**self).selection()
    }

    fn set_selection(&self, selection: Selection, origin: ChangeOrigin) {
        (**self).set_selection(selection, origin)
    }

    fn subscribe_changes(&self, listener: Box<dyn Fn(ChangeOrigin)>) {
        (**self).subscribe_changes(listener)
    }

    fn delete_text(&self, index: usize, length: usize, origin: ChangeOrigin) {
        (**self).delete_text(index, length, origin)
    }

    fn insert_text(&self, index: usize, text: &str, origin: ChangeOrigin) {
        (**self).insert_text(index, text, origin)
    }

    fn set_history_ignore(&self, ignore: bool) {
        (**self).set_history_ignore(ignore)
    }

    fn root_html(&self) -> String {
        (**self).root_html()
    }

    fn root_attribute(&self, name: &str) -> Option<String> {
        (**self).root_attribute(name)
    }

    fn set_root_attribute(&self, name: &str, value: &str) {
        (**self).set_root_attribute(name, value)
    }

    fn register_inline_format(&self, name: &str) {
        (**self).register_inline_format(name)
    }

    fn external_checker_attached(&self) -> bool {
        (**self).external_checker_attached()
    }

    fn set_loading(&self, loading: bool) {
        (**self).set_loading(loading)
    }
}

/// Runs `f` with the undo history ignoring changes, then re-enables it.
pub(crate) fn without_history<E, R>(editor: &E, f: impl FnOnce() -> R) -> R
where
    E: HostEditor + ?Sized,
{
    editor.set_history_ignore(true);
    let result = f();
    editor.set_history_ignore(false);
    result
}
