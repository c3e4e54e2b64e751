//! Error types for ltcheck.

/// Main error type for check cycles, popups and settings loading.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("checker transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The checker answered with a non-success status.
    #[error("checker returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON document.
    #[error("could not decode checker response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A decoration was activated whose backing match is gone from the store.
    ///
    /// This means offset reconciliation went wrong somewhere; it is never
    /// a recoverable condition.
    #[error("no match at offset {offset} (length {length}) for rule '{rule_id}'")]
    MatchNotFound {
        offset: usize,
        length: usize,
        rule_id: String,
    },

    /// A popup action was requested but no popup is open.
    #[error("no suggestion popup is open")]
    NoPopupOpen,

    /// The chosen replacement index is not one of the offered candidates.
    #[error("popup has no replacement at index {0}")]
    NoSuchReplacement(usize),

    /// Malformed settings file.
    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
}

impl Error {
    /// Whether the error is an internal inconsistency rather than an
    /// environmental failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MatchNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
