//! Shapes of data returned by a probe

use serde_json::{json, Value};

use crate::matcher::MatchSpec;
use crate::path::get_path;

/// A paginated collection response
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Number of records the service reports for this page
    pub record_count: usize,
    pub records: Vec<Value>,
    /// The full response the page was read from
    pub envelope: Value,
}

/// What a single probe invocation observed
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    Page(Page),
    Record(Value),
}

/// Where a located match lives, used for value extraction
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Located<'a> {
    InPage { record: &'a Value, envelope: &'a Value },
    Whole(&'a Value),
}

/// Read a `recordCount`, accepting numbers and numeric strings.
/// Anything else counts as an empty page.
fn parse_record_count(count: &Value) -> usize {
    let count = match count {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    };
    count.filter(|c| c.is_finite()).map_or(0, |c| c.max(0.0) as usize)
}

impl ProbeResult {
    /// Classify an API response of the form `{"data": ...}`.
    ///
    /// A `data` object carrying `recordCount` is a page whose records are
    /// read from `data.records`; anything else is a single record.
    pub fn from_response(response: Value) -> Self {
        let page = response.get("data").and_then(|data| {
            let count = data.get("recordCount")?;
            let record_count = parse_record_count(count);
            let records = data
                .get("records")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            Some((record_count, records))
        });

        match page {
            Some((record_count, records)) => ProbeResult::Page(Page {
                record_count,
                records,
                envelope: response,
            }),
            None => ProbeResult::Record(response),
        }
    }

    /// Build a page directly from records, with a `{"data": ...}` envelope
    pub fn page(records: Vec<Value>) -> Self {
        let envelope = json!({
            "data": {
                "recordCount": records.len(),
                "records": records.clone(),
            }
        });
        ProbeResult::Page(Page {
            record_count: records.len(),
            records,
            envelope,
        })
    }

    /// Locate the first candidate satisfying `spec`.
    ///
    /// Page records are scanned in order and only up to `record_count`.
    /// A field map checks a single record's `data` object when it has one;
    /// a predicate always sees the whole record.
    pub(crate) fn locate(&self, spec: &MatchSpec) -> Option<Located<'_>> {
        match self {
            ProbeResult::Page(page) => page
                .records
                .iter()
                .take(page.record_count)
                .find(|record| spec.matches(record))
                .map(|record| Located::InPage {
                    record,
                    envelope: &page.envelope,
                }),
            ProbeResult::Record(record) => {
                let candidate = match spec {
                    MatchSpec::FieldEquals(_) => match record.get("data") {
                        Some(data) if data.is_object() => data,
                        _ => record,
                    },
                    MatchSpec::Predicate(_) => record,
                };
                spec.matches(candidate).then_some(Located::Whole(record))
            }
        }
    }

    /// The response as a single JSON value, for diagnostics
    pub fn to_value(&self) -> Value {
        match self {
            ProbeResult::Page(page) => page.envelope.clone(),
            ProbeResult::Record(record) => record.clone(),
        }
    }
}

impl Located<'_> {
    /// Resolve `path` against the located match.
    ///
    /// A page match is seen as `{"data": <record>}` first so the default
    /// `data.id` yields the matched record's id, then the page envelope.
    pub(crate) fn extract(&self, path: &str) -> Option<Value> {
        match self {
            Located::InPage { record, envelope } => {
                let view = json!({ "data": record });
                get_path(&view, path)
                    .cloned()
                    .or_else(|| get_path(envelope, path).cloned())
            }
            Located::Whole(record) => get_path(record, path).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_page() {
        let result = ProbeResult::from_response(json!({
            "status": 200,
            "data": {"recordCount": 2, "records": [{"id": 1}, {"id": 2}]}
        }));
        match result {
            ProbeResult::Page(page) => {
                assert_eq!(page.record_count, 2);
                assert_eq!(page.records.len(), 2);
            }
            other => panic!("expected page, got {:?}", other),
        }
    }

    #[test]
    fn test_from_response_record() {
        let result = ProbeResult::from_response(json!({"data": {"id": "order-42"}}));
        assert!(matches!(result, ProbeResult::Record(_)));
    }

    #[test]
    fn test_record_count_bounds_scan() {
        let result = ProbeResult::from_response(json!({
            "data": {"recordCount": 0, "records": [{"status": "b"}]}
        }));
        let spec = MatchSpec::fields(json!({"status": "b"}));
        assert!(result.locate(&spec).is_none());
    }

    #[test]
    fn test_record_count_as_numeric_string() {
        let result = ProbeResult::from_response(json!({
            "data": {"recordCount": "2", "records": [{"status": "a"}, {"status": "b"}]}
        }));
        assert!(matches!(&result, ProbeResult::Page(page) if page.record_count == 2));
        let spec = MatchSpec::fields(json!({"status": "b"}));
        assert!(result.locate(&spec).is_some());

        let result = ProbeResult::from_response(json!({
            "data": {"recordCount": "many", "records": [{"status": "b"}]}
        }));
        assert!(result.locate(&spec).is_none());
    }

    #[test]
    fn test_single_record_field_map_uses_data() {
        let result = ProbeResult::from_response(json!({"status": 200, "data": {"status": "shipped"}}));
        let spec = MatchSpec::fields(json!({"status": "shipped"}));
        assert!(result.locate(&spec).is_some());

        // The envelope's own status code must not satisfy a data field match
        let spec = MatchSpec::fields(json!({"status": 200}));
        assert!(result.locate(&spec).is_none());
    }

    #[test]
    fn test_predicate_sees_whole_record() {
        let result = ProbeResult::from_response(json!({"status": 204, "data": null}));
        let spec = MatchSpec::predicate(|res| res["status"] == 204);
        assert!(result.locate(&spec).is_some());
    }

    #[test]
    fn test_extract_from_page_match() {
        let result = ProbeResult::page(vec![json!({"id": 1}), json!({"id": 2, "name": "two"})]);
        let spec = MatchSpec::fields(json!({"id": 2}));
        let located = result.locate(&spec).unwrap();
        assert_eq!(located.extract("data.id"), Some(json!(2)));
        assert_eq!(located.extract("data.name"), Some(json!("two")));
        assert_eq!(located.extract("data.recordCount"), Some(json!(2)));
        assert_eq!(located.extract("data.missing"), None);
    }
}
