//! Op-list document model shared with the host editor.
//!
//! A document is a delta made only of inserts. A change is a delta of
//! retains, inserts and deletes applied from the start of the document.
//! All lengths are UTF-16 code units; an embed has length 1.

use serde_json::{Map, Value};

use crate::document::utf16_len;

/// Formatting attributes of a run. A `Value::Null` entry in a retain removes
/// that attribute.
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    Text(String),
    /// Non-text content such as `{"image": "https://..."}`.
    Embed(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Insert {
        insert: Insert,
        attributes: Attributes,
    },
    Retain {
        len: usize,
        attributes: Attributes,
    },
    Delete(usize),
}

impl Op {
    /// Length of the op in UTF-16 code units.
    pub fn len(&self) -> usize {
        match self {
            Op::Insert {
                insert: Insert::Text(text),
                ..
            } => utf16_len(text),
            Op::Insert {
                insert: Insert::Embed(_),
                ..
            } => 1,
            Op::Retain { len, .. } => *len,
            Op::Delete(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => Some(attributes),
            Op::Delete(_) => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => Some(attributes),
            Op::Delete(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delta {
    pub ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(self, text: impl Into<String>) -> Self {
        self.insert_with(text, Attributes::new())
    }

    pub fn insert_with(mut self, text: impl Into<String>, attributes: Attributes) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.ops.push(Op::Insert {
                insert: Insert::Text(text),
                attributes,
            });
        }
        self
    }

    pub fn embed(mut self, value: Value) -> Self {
        self.ops.push(Op::Insert {
            insert: Insert::Embed(value),
            attributes: Attributes::new(),
        });
        self
    }

    pub fn retain(self, len: usize) -> Self {
        self.retain_with(len, Attributes::new())
    }

    pub fn retain_with(mut self, len: usize, attributes: Attributes) -> Self {
        if len > 0 {
            self.ops.push(Op::Retain { len, attributes });
        }
        self
    }

    pub fn delete(mut self, len: usize) -> Self {
        if len > 0 {
            self.ops.push(Op::Delete(len));
        }
        self
    }

    /// Total length of the ops in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Text of the insert ops, embeds skipped.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    insert: Insert::Text(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
