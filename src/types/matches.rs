//! Match and decoration reference types.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One issue reported by the checker.
///
/// `offset` and `length` are UTF-16 code units into the extracted plain text.
/// The offset moves when an earlier suggestion changes the document length;
/// the length never changes once the checker issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub(crate) offset: usize,
    length: usize,
    /// Opaque rule identifier from the checker.
    pub rule_id: String,
    /// Short headline for the popup title.
    pub short_message: String,
    /// Full explanation for the popup body.
    pub message: String,
    /// Replacement candidates, best first. May be empty.
    pub replacements: Vec<String>,
}

impl Match {
    pub fn new(offset: usize, length: usize, rule_id: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            rule_id: rule_id.into(),
            short_message: String::new(),
            message: String::new(),
            replacements: Vec::new(),
        }
    }

    pub fn with_messages(
        mut self,
        short_message: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.short_message = short_message.into();
        self.message = message.into();
        self
    }

    pub fn with_replacements<I, S>(mut self, replacements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replacements = replacements.into_iter().map(Into::into).collect();
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn span(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Whether two matches share at least one code unit.
    pub fn overlaps(&self, other: &Match) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// The correlation triple stored on this match's decoration.
    pub fn decoration_ref(&self) -> DecorationRef {
        DecorationRef {
            offset: self.offset,
            length: self.length,
            rule_id: self.rule_id.clone(),
        }
    }

    pub fn is_referenced_by(&self, reference: &DecorationRef) -> bool {
        self.offset == reference.offset
            && self.length == reference.length
            && self.rule_id == reference.rule_id
    }
}

/// Back-reference from a decoration to the match it renders.
///
/// The checker gives matches no stable identity, so the popup finds the
/// match again by this exact triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationRef {
    pub offset: usize,
    pub length: usize,
    pub rule_id: String,
}

impl DecorationRef {
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_symmetric_and_exclusive_at_edges() {
        let a = Match::new(0, 4, "A");
        let b = Match::new(4, 2, "B");
        let c = Match::new(3, 2, "C");

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn decoration_ref_round_trips_through_json_attribute() {
        let m = Match::new(5, 4, "MORFOLOGIK_RULE_EN_US");
        let value = serde_json::to_value(m.decoration_ref()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"offset": 5, "length": 4, "ruleId": "MORFOLOGIK_RULE_EN_US"})
        );

        let back: DecorationRef = serde_json::from_value(value).unwrap();
        assert!(m.is_referenced_by(&back));
    }

    #[test]
    fn reference_requires_all_three_fields() {
        let m = Match::new(5, 4, "RULE");
        assert!(!m.is_referenced_by(&DecorationRef {
            offset: 5,
            length: 3,
            rule_id: "RULE".into()
        }));
        assert!(!m.is_referenced_by(&DecorationRef {
            offset: 5,
            length: 4,
            rule_id: "OTHER".into()
        }));
    }
}
