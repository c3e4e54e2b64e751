//! In-memory host editor.
//!
//! Keeps the document as a flat list of one-code-point pieces, which keeps
//! delta composition trivial at the cost of memory. Rendering follows the
//! host renderer's markup: one `<p>` per line, `<p><br></p>` for an empty
//! line, `<img>` for embeds and a `<quill-lt-match>` wrapper for decorated
//! runs.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde_json::Value;

use super::delta::{Attributes, Delta, Insert, Op};
use super::{ChangeOrigin, HostEditor, Selection};
use crate::overlay::{DECORATION_FORMAT, DECORATION_TAG};
use crate::types::DecorationRef;

#[derive(Debug, Clone, PartialEq)]
enum Atom {
    Char(char),
    Embed(Value),
}

impl Atom {
    fn len(&self) -> usize {
        match self {
            Atom::Char(c) => c.len_utf16(),
            Atom::Embed(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Piece {
    atom: Atom,
    attributes: Attributes,
}

/// A self-contained editor document with selection, undo history and
/// change notifications.
///
/// Listeners see every change together with its origin, including silent
/// ones; filtering is up to the listener.
#[derive(Default)]
pub struct MemoryEditor {
    pieces: RefCell<Vec<Piece>>,
    selection: Cell<Option<Selection>>,
    history: RefCell<Vec<Delta>>,
    history_ignored: Cell<bool>,
    listeners: RefCell<Vec<Box<dyn Fn(ChangeOrigin)>>>,
    root_attributes: RefCell<BTreeMap<String, String>>,
    formats: RefCell<Vec<String>>,
    external_checker: Cell<bool>,
    loading: Cell<bool>,
}

impl MemoryEditor {
    /// Create an editor holding `text`. A trailing newline is added when
    /// missing, since every line of a document is newline-terminated.
    pub fn new(text: &str) -> Self {
        let mut text = text.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Self::from_delta(Delta::new().insert(text))
    }

    pub fn from_delta(contents: Delta) -> Self {
        let editor = Self::default();
        *editor.pieces.borrow_mut() = explode(&contents.ops);
        editor
    }

    /// Plain text of the document, embeds skipped.
    pub fn text(&self) -> String {
        self.pieces
            .borrow()
            .iter()
            .filter_map(|piece| match piece.atom {
                Atom::Char(c) => Some(c),
                Atom::Embed(_) => None,
            })
            .collect()
    }

    /// Document length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.pieces.borrow().iter().map(|p| p.atom.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.borrow().is_empty()
    }

    /// Simulate the user typing `text` at `index`, leaving the caret after it.
    pub fn type_text(&self, index: usize, text: &str) {
        self.insert_text(index, text, ChangeOrigin::User);
        self.set_selection(
            Selection::caret(index + crate::document::utf16_len(text)),
            ChangeOrigin::User,
        );
    }

    /// Number of changes recorded in the undo history.
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn is_history_ignored(&self) -> bool {
        self.history_ignored.get()
    }

    pub fn registered_formats(&self) -> Vec<String> {
        self.formats.borrow().clone()
    }

    /// Pretend a third-party checker toolbar is present on the page.
    pub fn set_external_checker(&self, attached: bool) {
        self.external_checker.set(attached);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn record(&self, change: Delta, origin: ChangeOrigin) {
        if !self.history_ignored.get() {
            self.history.borrow_mut().push(change);
        }
        for listener in self.listeners.borrow().iter() {
            listener(origin);
        }
    }
}

impl HostEditor for MemoryEditor {
    fn contents(&self) -> Delta {
        implode(&self.pieces.borrow())
    }

    fn set_contents(&self, contents: Delta, origin: ChangeOrigin) {
        *self.pieces.borrow_mut() = explode(&contents.ops);
        let len = self.len();
        if let Some(selection) = self.selection.get() {
            self.selection.set(Some(clamp(selection, len)));
        }
        self.record(contents, origin);
    }

    fn update_contents(&self, change: Delta, origin: ChangeOrigin) {
        let pieces = std::mem::take(&mut *self.pieces.borrow_mut());
        *self.pieces.borrow_mut() = compose(pieces, &change);
        let len = self.len();
        if let Some(selection) = self.selection.get() {
            let moved = Selection::new(transform_index(selection.index, &change), selection.length);
            self.selection.set(Some(clamp(moved, len)));
        }
        self.record(change, origin);
    }

    fn selection(&self) -> Option<Selection> {
        self.selection.get()
    }

    fn set_selection(&self, selection: Selection, _origin: ChangeOrigin) {
        self.selection.set(Some(clamp(selection, self.len())));
    }

    fn subscribe_changes(&self, listener: Box<dyn Fn(ChangeOrigin)>) {
        self.listeners.borrow_mut().push(listener);
    }

    fn set_history_ignore(&self, ignore: bool) {
        self.history_ignored.set(ignore);
    }

    fn root_html(&self) -> String {
        render_html(&self.pieces.borrow())
    }

    fn root_attribute(&self, name: &str) -> Option<String> {
        self.root_attributes.borrow().get(name).cloned()
    }

    fn set_root_attribute(&self, name: &str, value: &str) {
        self.root_attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn register_inline_format(&self, name: &str) {
        let mut formats = self.formats.borrow_mut();
        if !formats.iter().any(|f| f == name) {
            formats.push(name.to_string());
        }
    }

    fn external_checker_attached(&self) -> bool {
        self.external_checker.get()
    }

    fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }
}

fn clamp(selection: Selection, len: usize) -> Selection {
    let index = selection.index.min(len);
    Selection::new(index, selection.length.min(len - index))
}

/// Where `index` ends up after `change` is applied.
fn transform_index(index: usize, change: &Delta) -> usize {
    let mut cursor = 0;
    let mut index = index;
    for op in &change.ops {
        if cursor > index {
            break;
        }
        match op {
            Op::Retain { len, .. } => cursor += len,
            Op::Insert { .. } => {
                index += op.len();
                cursor += op.len();
            }
            Op::Delete(len) => index -= (*len).min(index - cursor),
        }
    }
    index
}

fn explode(ops: &[Op]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for op in ops {
        if let Op::Insert { insert, attributes } = op {
            let attributes = without_nulls(attributes);
            match insert {
                Insert::Text(text) => pieces.extend(text.chars().map(|c| Piece {
                    atom: Atom::Char(c),
                    attributes: attributes.clone(),
                })),
                Insert::Embed(value) => pieces.push(Piece {
                    atom: Atom::Embed(value.clone()),
                    attributes,
                }),
            }
        }
    }
    pieces
}

fn implode(pieces: &[Piece]) -> Delta {
    let mut ops: Vec<Op> = Vec::new();
    for piece in pieces {
        match &piece.atom {
            Atom::Char(c) => {
                if let Some(Op::Insert {
                    insert: Insert::Text(text),
                    attributes,
                }) = ops.last_mut()
                {
                    if *attributes == piece.attributes {
                        text.push(*c);
                        continue;
                    }
                }
                ops.push(Op::Insert {
                    insert: Insert::Text(c.to_string()),
                    attributes: piece.attributes.clone(),
                });
            }
            Atom::Embed(value) => ops.push(Op::Insert {
                insert: Insert::Embed(value.clone()),
                attributes: piece.attributes.clone(),
            }),
        }
    }
    Delta { ops }
}

fn compose(document: Vec<Piece>, change: &Delta) -> Vec<Piece> {
    let mut rest = document.into_iter();
    let mut out = Vec::new();

    for op in &change.ops {
        match op {
            Op::Retain { len, attributes } => {
                let mut remaining = *len;
                while remaining > 0 {
                    let Some(mut piece) = rest.next() else {
                        break;
                    };
                    remaining = remaining.saturating_sub(piece.atom.len());
                    apply_attributes(&mut piece.attributes, attributes);
                    out.push(piece);
                }
            }
            Op::Delete(len) => {
                let mut remaining = *len;
                while remaining > 0 {
                    let Some(piece) = rest.next() else {
                        break;
                    };
                    remaining = remaining.saturating_sub(piece.atom.len());
                }
            }
            Op::Insert { .. } => out.extend(explode(std::slice::from_ref(op))),
        }
    }

    out.extend(rest);
    out
}

fn apply_attributes(target: &mut Attributes, change: &Attributes) {
    for (key, value) in change {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn without_nulls(attributes: &Attributes) -> Attributes {
    attributes
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn render_html(pieces: &[Piece]) -> String {
    let mut html = String::new();
    let mut line: Vec<&Piece> = Vec::new();

    for piece in pieces {
        if piece.atom == Atom::Char('\n') {
            render_line(&mut html, &line);
            line.clear();
        } else {
            line.push(piece);
        }
    }
    if !line.is_empty() {
        render_line(&mut html, &line);
    }
    html
}

fn render_line(html: &mut String, line: &[&Piece]) {
    html.push_str("<p>");
    if line.is_empty() {
        html.push_str("<br>");
    }

    let mut start = 0;
    while start < line.len() {
        let attributes = &line[start].attributes;
        let end = line[start..]
            .iter()
            .position(|p| p.attributes != *attributes || matches!(p.atom, Atom::Embed(_)))
            .map(|n| start + n.max(1))
            .unwrap_or(line.len());
        render_run(html, &line[start..end]);
        start = end;
    }
    html.push_str("</p>");
}

fn render_run(html: &mut String, run: &[&Piece]) {
    let attributes = &run[0].attributes;
    let decoration = attributes
        .get(DECORATION_FORMAT)
        .and_then(|value| serde_json::from_value::<DecorationRef>(value.clone()).ok());
    let bold = attributes.get("bold").is_some_and(|v| v == &Value::Bool(true));
    let italic = attributes.get("italic").is_some_and(|v| v == &Value::Bool(true));

    if let Some(decoration) = &decoration {
        html.push_str(&format!(
            "<{} data-offset=\"{}\" data-length=\"{}\" data-rule-id=\"{}\">",
            DECORATION_TAG,
            decoration.offset,
            decoration.length,
            escape(&decoration.rule_id).replace('"', "&quot;")
        ));
    }
    if bold {
        html.push_str("<strong>");
    }
    if italic {
        html.push_str("<em>");
    }

    for piece in run {
        match &piece.atom {
            Atom::Char(c) => html.push_str(&escape(c.encode_utf8(&mut [0; 4]))),
            Atom::Embed(value) => {
                let src = value.get("image").and_then(Value::as_str).unwrap_or("");
                html.push_str(&format!("<img src=\"{}\">", escape(src)));
            }
        }
    }

    if italic {
        html.push_str("</em>");
    }
    if bold {
        html.push_str("</strong>");
    }
    if decoration.is_some() {
        html.push_str(&format!("</{}>", DECORATION_TAG));
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}
