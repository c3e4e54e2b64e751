//! Settings infrastructure for ltcheck.
//!
//! This module provides support for loading and parsing ltcheck.toml files
//! that configure the checker server, language, debounce timing and extra
//! request options.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::debounce::SUPPRESSION_WINDOW;
use crate::error::Result;

/// Name of the settings file looked up by [`discover_settings`].
pub const SETTINGS_FILE: &str = "ltcheck.toml";

/// Root settings structure loaded from ltcheck.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Checker configuration.
    pub checker: Option<CheckerSettings>,
}

/// Checker settings. Keys may be written in snake_case or camelCase.
#[derive(Debug, Default, Deserialize)]
pub struct CheckerSettings {
    /// URL the check requests are POSTed to.
    pub server: Option<String>,

    /// Language code sent with every request, e.g. "en-US" or "auto".
    pub language: Option<String>,

    /// Turn off the editor's native spellchecker (default: true).
    #[serde(alias = "disableNativeSpellcheck")]
    pub disable_native_spellcheck: Option<bool>,

    /// Milliseconds without typing before a check runs.
    #[serde(alias = "cooldownTime")]
    pub cooldown_time: Option<u64>,

    /// Toggle the loading indicator while a request is in flight.
    #[serde(alias = "showLoadingIndicator")]
    pub show_loading_indicator: Option<bool>,

    /// Extra key/values merged into every request body.
    #[serde(alias = "apiOptions")]
    pub api_options: Option<BTreeMap<String, Value>>,

    /// Request body encoding: "json" or "form".
    pub encoding: Option<RequestEncoding>,

    /// Milliseconds the checker's own edits are hidden from the typing timer.
    #[serde(alias = "suppressionWindow")]
    pub suppression_window: Option<u64>,
}

/// How the request body is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestEncoding {
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`, as the public LanguageTool API
    /// expects on `/v2/check`.
    Form,
}

/// Fully resolved options.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub server: String,
    pub language: String,
    pub disable_native_spellcheck: bool,
    pub cooldown_time: Duration,
    pub show_loading_indicator: bool,
    pub api_options: BTreeMap<String, Value>,
    pub encoding: RequestEncoding,
    pub suppression_window: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            server: "https://languagetool.org/api".to_string(),
            language: "en-US".to_string(),
            disable_native_spellcheck: true,
            cooldown_time: Duration::from_millis(3000),
            show_loading_indicator: true,
            api_options: BTreeMap::new(),
            encoding: RequestEncoding::Json,
            suppression_window: SUPPRESSION_WINDOW,
        }
    }
}

impl Settings {
    /// Resolve settings against the defaults.
    pub fn options(&self) -> Options {
        let defaults = Options::default();
        let Some(checker) = &self.checker else {
            return defaults;
        };

        Options {
            server: checker.server.clone().unwrap_or(defaults.server),
            language: checker.language.clone().unwrap_or(defaults.language),
            disable_native_spellcheck: checker
                .disable_native_spellcheck
                .unwrap_or(defaults.disable_native_spellcheck),
            cooldown_time: checker
                .cooldown_time
                .map(Duration::from_millis)
                .unwrap_or(defaults.cooldown_time),
            show_loading_indicator: checker
                .show_loading_indicator
                .unwrap_or(defaults.show_loading_indicator),
            api_options: checker.api_options.clone().unwrap_or_default(),
            encoding: checker.encoding.unwrap_or(defaults.encoding),
            suppression_window: checker
                .suppression_window
                .map(Duration::from_millis)
                .unwrap_or(defaults.suppression_window),
        }
    }
}

/// Parse settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings> {
    Ok(toml::from_str(content)?)
}

/// Load settings from an ltcheck.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse settings");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover ltcheck.toml by searching up the directory tree, then direct children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Hosts that edit files from a project tree (a desktop app, an editor
/// plugin) call this with the open file's directory so a project-wide
/// ltcheck.toml applies to every document in it.
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found file. If not found, returns
/// `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    // Phase 1: Walk up from start_dir
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    // Phase 2: Check immediate child directories
    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join(SETTINGS_FILE);
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}
