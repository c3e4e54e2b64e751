//! Request and response bodies of the remote checker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::matches::Match;

/// Body of one check request.
///
/// Extra options are flattened next to `text` and `language`, so the JSON
/// body is a single flat object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRequest {
    pub text: String,
    pub language: String,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl CheckRequest {
    /// Build a request. Options named `text` or `language` are dropped, since
    /// they would desynchronize the offsets the checker returns.
    pub fn new(
        text: impl Into<String>,
        language: impl Into<String>,
        options: &BTreeMap<String, Value>,
    ) -> Self {
        let options = options
            .iter()
            .filter(|(key, _)| {
                let reserved = matches!(key.as_str(), "text" | "language");
                if reserved {
                    tracing::warn!(option = %key, "ignoring reserved api option");
                }
                !reserved
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            text: text.into(),
            language: language.into(),
            options,
        }
    }

    /// Flatten to `application/x-www-form-urlencoded` pairs.
    ///
    /// Strings are sent bare; every other JSON value is sent as its JSON text.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("text".to_string(), self.text.clone()),
            ("language".to_string(), self.language.clone()),
        ];
        pairs.extend(self.options.iter().map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        }));
        pairs
    }
}

/// Top-level checker response. A missing `matches` key means no matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub matches: Option<Vec<WireMatch>>,
}

impl CheckResponse {
    pub fn into_matches(self) -> Vec<Match> {
        self.matches
            .unwrap_or_default()
            .into_iter()
            .map(Match::from)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMatch {
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub short_message: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub rule: WireRule,
    #[serde(default)]
    pub replacements: Vec<WireReplacement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireRule {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReplacement {
    pub value: String,
}

impl From<WireMatch> for Match {
    fn from(wire: WireMatch) -> Self {
        Match::new(wire.offset, wire.length, wire.rule.id)
            .with_messages(wire.short_message, wire.message)
            .with_replacements(wire.replacements.into_iter().map(|r| r.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_flattens_options() {
        let mut options = BTreeMap::new();
        options.insert("level".to_string(), json!("picky"));
        options.insert("enabledOnly".to_string(), json!(false));

        let request = CheckRequest::new("Helo", "en-US", &options);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({"text": "Helo", "language": "en-US", "level": "picky", "enabledOnly": false})
        );
    }

    #[test]
    fn request_drops_reserved_options() {
        let mut options = BTreeMap::new();
        options.insert("text".to_string(), json!("other"));
        options.insert("language".to_string(), json!("de-DE"));

        let request = CheckRequest::new("Helo", "en-US", &options);
        assert!(request.options.is_empty());
        assert_eq!(request.language, "en-US");
    }

    #[test]
    fn form_pairs_stringify_non_strings() {
        let mut options = BTreeMap::new();
        options.insert("enabledOnly".to_string(), json!(false));

        let request = CheckRequest::new("a & b", "en-US", &options);
        assert_eq!(
            request.form_pairs(),
            vec![
                ("text".to_string(), "a & b".to_string()),
                ("language".to_string(), "en-US".to_string()),
                ("enabledOnly".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn response_without_matches_is_empty() {
        let response: CheckResponse = serde_json::from_str(r#"{"software": {}}"#).unwrap();
        assert!(response.into_matches().is_empty());
    }

    #[test]
    fn response_decodes_languagetool_match() {
        let body = r#"{
            "matches": [{
                "message": "Possible spelling mistake found.",
                "shortMessage": "Spelling mistake",
                "replacements": [{"value": "Hello"}, {"value": "Help"}],
                "offset": 0,
                "length": 4,
                "rule": {"id": "MORFOLOGIK_RULE_EN_US", "description": "Possible Typo"}
            }]
        }"#;
        let response: CheckResponse = serde_json::from_str(body).unwrap();
        let matches = response.into_matches();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.span(), 0..4);
        assert_eq!(m.rule_id, "MORFOLOGIK_RULE_EN_US");
        assert_eq!(m.short_message, "Spelling mistake");
        assert_eq!(m.replacements, vec!["Hello", "Help"]);
    }
}
