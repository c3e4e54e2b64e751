//! Match records and the checker wire format.
//!
//! This module provides:
//! - `Match`, one issue flagged by the checker, owned by the match store
//! - `DecorationRef`, the (offset, length, rule id) triple a decoration carries
//! - Request/response types exchanged with the remote checker

mod matches;
mod wire;

pub use matches::{DecorationRef, Match};
pub use wire::{CheckRequest, CheckResponse, WireMatch, WireReplacement, WireRule};
