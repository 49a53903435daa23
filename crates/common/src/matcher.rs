//! Match conditions evaluated against probed records

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Predicate signature for [`MatchSpec::Predicate`]
pub type RecordPredicate = dyn Fn(&Value) -> bool + Send + Sync;

/// The success condition of a poll.
///
/// The variant decides both how a candidate is evaluated and what the
/// default failure message looks like.
#[derive(Clone)]
pub enum MatchSpec {
    /// Every listed field must be present on the candidate and strictly equal
    FieldEquals(Map<String, Value>),

    /// Arbitrary test on the candidate
    Predicate(Arc<RecordPredicate>),
}

impl MatchSpec {
    /// Field-map condition from a JSON object.
    ///
    /// A non-object value yields an empty map, which never matches.
    pub fn fields(expected: Value) -> Self {
        match expected {
            Value::Object(map) => MatchSpec::FieldEquals(map),
            _ => MatchSpec::FieldEquals(Map::new()),
        }
    }

    /// Field-map condition from key/value pairs
    pub fn field_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        MatchSpec::FieldEquals(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Predicate condition
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        MatchSpec::Predicate(Arc::new(predicate))
    }

    /// Evaluate the condition against one candidate
    pub fn matches(&self, candidate: &Value) -> bool {
        match self {
            MatchSpec::FieldEquals(expected) => {
                // An empty map confirms nothing, so it never matches
                !expected.is_empty()
                    && expected
                        .iter()
                        .all(|(key, want)| candidate.get(key) == Some(want))
            }
            MatchSpec::Predicate(predicate) => predicate(candidate),
        }
    }

    /// Default failure description when the caller supplied none
    pub fn describe_miss(&self) -> String {
        match self {
            MatchSpec::FieldEquals(expected) => {
                let criteria = serde_json::to_string(expected).unwrap_or_else(|_| "{}".to_string());
                format!("{} not found", criteria)
            }
            MatchSpec::Predicate(_) => "Record not found".to_string(),
        }
    }
}

impl fmt::Debug for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSpec::FieldEquals(expected) => f.debug_tuple("FieldEquals").field(expected).finish(),
            MatchSpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_fields_must_match() {
        let spec = MatchSpec::fields(json!({"status": "b", "owner": "qa"}));
        assert!(spec.matches(&json!({"id": 2, "status": "b", "owner": "qa"})));
        assert!(!spec.matches(&json!({"id": 3, "status": "b", "owner": "ops"})));
        assert!(!spec.matches(&json!({"id": 4, "status": "b"})));
    }

    #[test]
    fn test_strict_equality() {
        let spec = MatchSpec::fields(json!({"count": 1}));
        assert!(!spec.matches(&json!({"count": "1"})));
        assert!(!spec.matches(&json!({"count": 1.5})));
        assert!(spec.matches(&json!({"count": 1})));
    }

    #[test]
    fn test_empty_field_map_never_matches() {
        let spec = MatchSpec::fields(json!({}));
        assert!(!spec.matches(&json!({"anything": true})));
        assert!(!MatchSpec::fields(json!("status")).matches(&json!({"status": "x"})));
    }

    #[test]
    fn test_predicate() {
        let spec = MatchSpec::predicate(|v| v["status"] == "shipped");
        assert!(spec.matches(&json!({"status": "shipped"})));
        assert!(!spec.matches(&json!({"status": "pending"})));
    }

    #[test]
    fn test_describe_miss() {
        let spec = MatchSpec::field_pairs([("status", "shipped")]);
        assert_eq!(spec.describe_miss(), r#"{"status":"shipped"} not found"#);
        assert_eq!(MatchSpec::predicate(|_| false).describe_miss(), "Record not found");
    }
}
