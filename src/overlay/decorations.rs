//! Inline decorations for active matches.
//!
//! A decoration is the `ltmatch` attribute over the flagged range, holding
//! the match's correlation triple. Adding or removing one never changes the
//! document text, stays out of the undo history, and keeps the selection
//! where it was.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tokio::time::Instant;

use crate::debounce::DebounceController;
use crate::editor::{without_history, Attributes, ChangeOrigin, Delta, HostEditor, Op};
use crate::types::{DecorationRef, Match};

/// Attribute name of the decoration format registered with the host.
pub const DECORATION_FORMAT: &str = "ltmatch";

/// Element the host renders decorated runs with.
pub const DECORATION_TAG: &str = "quill-lt-match";

static DECORATION_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<quill-lt-match .+?>(.*?)</quill-lt-match>").unwrap()
});

/// A decoration found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub span: Range<usize>,
    pub target: DecorationRef,
}

/// Strip every decoration wrapper from rendered markup, keeping its content.
pub fn clean_html(html: &str) -> String {
    DECORATION_WRAPPER.replace_all(html, "$1").into_owned()
}

/// List the decorations present in a document, in document order.
///
/// Adjacent runs carrying the same reference form one decoration.
pub fn decorations(contents: &Delta) -> Vec<Decoration> {
    let mut found: Vec<Decoration> = Vec::new();
    let mut position = 0;

    for op in &contents.ops {
        let len = op.len();
        let target = op
            .attributes()
            .and_then(|attributes| attributes.get(DECORATION_FORMAT))
            .and_then(|value| serde_json::from_value::<DecorationRef>(value.clone()).ok());

        if let Some(target) = target {
            match found.last_mut() {
                Some(last) if last.target == target && last.span.end == position => {
                    last.span.end += len;
                }
                _ => found.push(Decoration {
                    span: position..position + len,
                    target,
                }),
            }
        }
        position += len;
    }
    found
}

/// Remove every decoration in one silent, history-less batch and restore the
/// selection afterwards. Does nothing when the document has no decorations.
pub fn remove_decorations<E: HostEditor + ?Sized>(editor: &E) {
    let selection = editor.selection();
    let mut contents = editor.contents();

    let mut removed = 0;
    for op in &mut contents.ops {
        if let Some(attributes) = op.attributes_mut() {
            if attributes.remove(DECORATION_FORMAT).is_some() {
                removed += 1;
            }
        }
    }
    if removed == 0 {
        return;
    }

    without_history(editor, || editor.set_contents(contents, ChangeOrigin::Silent));
    if let Some(selection) = selection {
        editor.set_selection(selection, ChangeOrigin::Silent);
    }
}

/// Add one decoration per match, in the given order.
pub fn paint_decorations<E: HostEditor + ?Sized>(
    editor: &E,
    matches: &[Match],
    debounce: &mut DebounceController,
) {
    let selection = editor.selection();

    for m in matches {
        debounce.suppress(Instant::now());
        let change = Delta::new()
            .retain(m.offset())
            .retain_with(m.length(), decoration_attributes(m));
        without_history(editor, || editor.update_contents(change, ChangeOrigin::Silent));
    }

    if let Some(selection) = selection {
        editor.set_selection(selection, ChangeOrigin::Silent);
    }
}

/// Clear all decorations and paint one per match.
pub fn repaint<E: HostEditor + ?Sized>(
    editor: &E,
    matches: &[Match],
    debounce: &mut DebounceController,
) {
    debounce.suppress(Instant::now());
    remove_decorations(editor);
    paint_decorations(editor, matches, debounce);
}

fn decoration_attributes(m: &Match) -> Attributes {
    let mut attributes = Attributes::new();
    let value = serde_json::to_value(m.decoration_ref()).unwrap_or(Value::Null);
    attributes.insert(DECORATION_FORMAT.to_string(), value);
    attributes
}

/// Whether an op carries a decoration.
pub fn is_decorated(op: &Op) -> bool {
    op.attributes()
        .is_some_and(|attributes| attributes.contains_key(DECORATION_FORMAT))
}
