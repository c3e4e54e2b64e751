//! Document-side state of the checker.
//!
//! This module provides:
//! - `extract` for rendered markup -> checker plain text conversion
//! - UTF-16 offset helpers shared with the host editor
//! - `MatchStore`, the list of active matches
//! - `Edit`, the offset arithmetic applied when a suggestion is accepted

mod offsets;
mod state;
mod text;

pub use offsets::Edit;
pub use state::MatchStore;
pub use text::{extract, utf16_len, utf16_slice, utf16_to_byte};
