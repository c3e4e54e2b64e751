//! Suggestion popup shown when a decoration is activated.
//!
//! The popup model lives here; drawing and positioning it next to the
//! decoration is the host's job.

use tokio::time::Instant;

use crate::debounce::DebounceController;
use crate::document::{utf16_len, Edit, MatchStore};
use crate::editor::{ChangeOrigin, HostEditor, Selection};
use crate::error::{Error, Result};
use crate::types::{DecorationRef, Match};

use super::decorations::repaint;

/// At most this many replacement candidates are offered.
pub const MAX_REPLACEMENTS: usize = 3;

/// Where the popup sits relative to its decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopEnd,
}

/// Content and placement of an open popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    /// The decoration the popup belongs to.
    pub target: DecorationRef,
    pub title: String,
    pub description: String,
    pub replacements: Vec<String>,
    pub placement: Placement,
    /// Skidding and distance from the decoration, in pixels.
    pub offset: (i32, i32),
    /// Bumped every time the host should lay the popup out again.
    pub layout_pass: u32,
}

impl Popup {
    fn for_match(m: &Match) -> Self {
        Self {
            target: m.decoration_ref(),
            title: m.short_message.clone(),
            description: m.message.clone(),
            replacements: m
                .replacements
                .iter()
                .take(MAX_REPLACEMENTS)
                .cloned()
                .collect(),
            placement: Placement::TopEnd,
            offset: (0, 8),
            layout_pass: 0,
        }
    }
}

/// Keeps track of the single open popup.
#[derive(Debug, Default)]
pub struct PopupManager {
    open: Option<Popup>,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Popup> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Open the popup for an activated decoration, closing any other.
    ///
    /// A decoration whose match is not in the store is an offset
    /// bookkeeping bug and yields [`Error::MatchNotFound`].
    pub fn activate(&mut self, store: &MatchStore, target: &DecorationRef) -> Result<&Popup> {
        tracing::debug!(
            offset = target.offset,
            length = target.length,
            rule = %target.rule_id,
            "suggestion clicked"
        );

        let Some(m) = store.find(target) else {
            tracing::error!(
                offset = target.offset,
                length = target.length,
                rule = %target.rule_id,
                matches = store.len(),
                "decoration has no backing match"
            );
            return Err(Error::MatchNotFound {
                offset: target.offset,
                length: target.length,
                rule_id: target.rule_id.clone(),
            });
        };

        if self.open.is_some() {
            self.close();
        }
        Ok(self.open.insert(Popup::for_match(m)))
    }

    /// Close the popup without touching the document.
    pub fn close(&mut self) -> Option<Popup> {
        let closed = self.open.take();
        if closed.is_some() {
            tracing::debug!("closing popup");
        }
        closed
    }

    /// Ask the host to lay out the open popup again, e.g. after a resize.
    pub fn reposition(&mut self) -> Option<&Popup> {
        let popup = self.open.as_mut()?;
        popup.layout_pass += 1;
        Some(popup)
    }

    /// Accept replacement `index` of the open popup.
    ///
    /// Replaces the flagged span, puts the caret after the new text, shifts
    /// the remaining matches, repaints the decorations and closes the popup.
    /// The text edit goes into the undo history; the decoration changes
    /// don't.
    pub fn apply<E: HostEditor + ?Sized>(
        &mut self,
        editor: &E,
        store: &mut MatchStore,
        debounce: &mut DebounceController,
        index: usize,
    ) -> Result<Edit> {
        let popup = self.open.as_ref().ok_or(Error::NoPopupOpen)?;
        let replacement = popup
            .replacements
            .get(index)
            .ok_or(Error::NoSuchReplacement(index))?
            .clone();
        let target = popup.target.clone();
        if store.find(&target).is_none() {
            return Err(Error::MatchNotFound {
                offset: target.offset,
                length: target.length,
                rule_id: target.rule_id,
            });
        }

        let edit = Edit::new(target.offset, target.length, utf16_len(&replacement));
        tracing::debug!(
            offset = edit.offset,
            original = edit.original_length,
            replacement = %replacement,
            "applying suggestion"
        );

        debounce.suppress(Instant::now());
        editor.set_selection(
            Selection::new(edit.offset, edit.original_length),
            ChangeOrigin::Silent,
        );
        editor.update_contents(edit.to_delta(&replacement), ChangeOrigin::Silent);
        editor.set_selection(
            Selection::caret(edit.offset + edit.new_length),
            ChangeOrigin::Silent,
        );

        store.apply_replacement(edit.offset, edit.original_length, edit.new_length);
        repaint(editor, store.as_slice(), debounce);
        self.close();
        Ok(edit)
    }
}
