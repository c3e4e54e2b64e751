//! Authoritative list of active matches.

use crate::types::{DecorationRef, Match};

use super::offsets::Edit;

/// The matches currently shown in one editor.
///
/// Replaced wholesale by every check cycle; shrunk one match at a time as
/// suggestions are accepted.
#[derive(Debug, Default, Clone)]
pub struct MatchStore {
    matches: Vec<Match>,
}

impl MatchStore {
    /// Create a new empty match store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new set of matches.
    ///
    /// Matches are kept in the given order. A match that overlaps, or shares
    /// its offset with, an earlier kept match is dropped. Returns the number
    /// of dropped matches.
    pub fn replace(&mut self, matches: Vec<Match>) -> usize {
        let total = matches.len();
        let mut kept: Vec<Match> = Vec::with_capacity(total);

        for candidate in matches {
            let conflict = kept
                .iter()
                .any(|m| m.offset() == candidate.offset() || m.overlaps(&candidate));
            if conflict {
                tracing::debug!(
                    offset = candidate.offset(),
                    length = candidate.length(),
                    rule = %candidate.rule_id,
                    "dropping overlapping match"
                );
            } else {
                kept.push(candidate);
            }
        }

        let dropped = total - kept.len();
        self.matches = kept;
        dropped
    }

    /// Remove every match.
    pub fn clear(&mut self) {
        self.matches.clear();
    }

    /// Exact lookup by the triple a decoration carries.
    pub fn find_by_offset_length_rule(
        &self,
        offset: usize,
        length: usize,
        rule_id: &str,
    ) -> Option<&Match> {
        self.find(&DecorationRef {
            offset,
            length,
            rule_id: rule_id.to_string(),
        })
    }

    pub fn find(&self, reference: &DecorationRef) -> Option<&Match> {
        self.matches.iter().find(|m| m.is_referenced_by(reference))
    }

    /// Account for a suggestion accepted at `resolved_offset`.
    ///
    /// The match at that offset is removed and returned; every match after it
    /// moves by `new_length - original_length`. Matches before it are left
    /// alone.
    pub fn apply_replacement(
        &mut self,
        resolved_offset: usize,
        original_length: usize,
        new_length: usize,
    ) -> Option<Match> {
        let edit = Edit::new(resolved_offset, original_length, new_length);
        let index = self
            .matches
            .iter()
            .position(|m| m.offset() == resolved_offset);
        let removed = index.map(|i| self.matches.remove(i));

        for m in &mut self.matches {
            m.offset = edit.shift(m.offset);
        }
        removed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl<'a> IntoIterator for &'a MatchStore {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(offsets: &[usize]) -> MatchStore {
        let mut store = MatchStore::new();
        store.replace(offsets.iter().map(|&o| Match::new(o, 5, "R")).collect());
        store
    }

    fn offsets(store: &MatchStore) -> Vec<usize> {
        store.iter().map(Match::offset).collect()
    }

    #[test]
    fn apply_replacement_removes_and_shifts() {
        let mut store = store(&[0, 10, 20]);
        let removed = store.apply_replacement(10, 5, 8);

        assert_eq!(removed.map(|m| m.offset()), Some(10));
        assert_eq!(offsets(&store), vec![0, 23]);
    }

    #[test]
    fn apply_replacement_with_shorter_text() {
        let mut store = store(&[0, 10, 20]);
        store.apply_replacement(0, 5, 1);
        assert_eq!(offsets(&store), vec![6, 16]);
    }

    #[test]
    fn apply_replacement_at_unknown_offset_still_shifts() {
        let mut store = store(&[0, 20]);
        assert!(store.apply_replacement(10, 5, 6).is_none());
        assert_eq!(offsets(&store), vec![0, 21]);
    }

    #[test]
    fn replace_keeps_first_of_overlapping_matches() {
        let mut store = MatchStore::new();
        let dropped = store.replace(vec![
            Match::new(0, 4, "A"),
            Match::new(2, 4, "B"),
            Match::new(5, 4, "C"),
            Match::new(5, 0, "D"),
        ]);

        assert_eq!(dropped, 2);
        let rules: Vec<_> = store.iter().map(|m| m.rule_id.as_str()).collect();
        assert_eq!(rules, vec!["A", "C"]);
    }

    #[test]
    fn replace_discards_previous_matches() {
        let mut store = store(&[0, 10]);
        store.replace(vec![Match::new(3, 1, "X")]);
        assert_eq!(offsets(&store), vec![3]);
    }

    #[test]
    fn find_requires_exact_triple() {
        let store = store(&[0, 10]);
        assert!(store.find_by_offset_length_rule(10, 5, "R").is_some());
        assert!(store.find_by_offset_length_rule(10, 4, "R").is_none());
        assert!(store.find_by_offset_length_rule(10, 5, "S").is_none());
        assert!(store.find_by_offset_length_rule(11, 5, "R").is_none());
    }

    #[test]
    fn find_by_decoration_reference() {
        let store = store(&[0, 10]);
        let reference = store.as_slice()[1].decoration_ref();
        assert_eq!(store.find(&reference).map(Match::offset), Some(10));
    }
}
