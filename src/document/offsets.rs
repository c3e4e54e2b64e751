//! Offset arithmetic for accepted suggestions.

use crate::editor::Delta;

/// Replacement of `original_length` code units at `offset` with
/// `new_length` code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub original_length: usize,
    pub new_length: usize,
}

impl Edit {
    pub fn new(offset: usize, original_length: usize, new_length: usize) -> Self {
        Self {
            offset,
            original_length,
            new_length,
        }
    }

    /// Change in document length caused by the edit.
    pub fn diff(&self) -> isize {
        self.new_length as isize - self.original_length as isize
    }

    /// Where an offset ends up after the edit.
    ///
    /// Only offsets strictly after the edited one move. Checker matches never
    /// overlap, so any such offset lies at or past the end of the replaced
    /// span and cannot underflow.
    pub fn shift(&self, offset: usize) -> usize {
        if offset > self.offset {
            offset.saturating_add_signed(self.diff())
        } else {
            offset
        }
    }

    /// The change delta performing this edit with `replacement` as new text.
    pub fn to_delta(&self, replacement: &str) -> Delta {
        Delta::new()
            .retain(self.offset)
            .delete(self.original_length)
            .insert(replacement)
    }
}
