//! What the checker draws on top of the document.
//!
//! This module provides:
//! - Decoration painting and removal for active matches
//! - The suggestion popup model and suggestion application
//! - The loading indicator toggle

mod decorations;
mod loading;
mod popup;

pub use decorations::{
    clean_html, decorations, is_decorated, paint_decorations, remove_decorations, repaint,
    Decoration, DECORATION_FORMAT, DECORATION_TAG,
};
pub use loading::LoadingIndicator;
pub use popup::{Placement, Popup, PopupManager, MAX_REPLACEMENTS};
