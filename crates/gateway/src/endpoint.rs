//! Path and query-string helpers used by the feature services.

use serde_json::{Map, Value};

/// One piece of a resource path. `Skip` segments are dropped when joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Value(String),
    Skip,
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Segment::Value(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Segment::Value(value)
    }
}

impl From<&String> for Segment {
    fn from(value: &String) -> Self {
        Segment::Value(value.clone())
    }
}

macro_rules! segment_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Segment {
            fn from(value: $t) -> Self {
                Segment::Value(value.to_string())
            }
        })*
    };
}

segment_from_int!(i32, i64, u32, u64, usize);

impl<T: Into<Segment>> From<Option<T>> for Segment {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Segment::Skip)
    }
}

/// Join `base` and `segments` with `/`, always producing a leading slash.
///
/// Skipped and empty segments are left out, so `("/client", [None, 5, "update"])`
/// becomes `/client/5/update`.
pub fn join_path<I>(base: &str, segments: I) -> String
where
    I: IntoIterator,
    I::Item: Into<Segment>,
{
    let mut parts: Vec<String> = Vec::new();
    let base = base.trim_matches('/');
    if !base.is_empty() {
        parts.push(base.to_string());
    }
    for segment in segments {
        if let Segment::Value(value) = segment.into() {
            let value = value.trim_matches('/');
            if !value.is_empty() {
                parts.push(value.to_string());
            }
        }
    }
    format!("/{}", parts.join("/"))
}

/// `endpoint!("/client", id, "update")` joins mixed segment types.
#[macro_export]
macro_rules! endpoint {
    ($base:expr $(, $segment:expr)* $(,)?) => {
        {
            let segments: ::std::vec::Vec<$crate::endpoint::Segment> =
                ::std::vec![$($crate::endpoint::Segment::from($segment)),*];
            $crate::endpoint::join_path($base, segments)
        }
    };
}

/// Serialize a flat JSON object as a query string.
///
/// `null` and empty-string values are dropped, arrays become repeated keys
/// (`key=a&key=b`) and the remaining keys keep their input order.
pub fn build_query(params: &Value) -> String {
    match params {
        Value::Object(map) => build_query_from_map(map),
        _ => String::new(),
    }
}

fn build_query_from_map(map: &Map<String, Value>) -> String {
    let mut pairs: Vec<String> = Vec::new();
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    push_pair(&mut pairs, key, item);
                }
            }
            other => push_pair(&mut pairs, key, other),
        }
    }
    pairs.join("&")
}

fn push_pair(pairs: &mut Vec<String>, key: &str, value: &Value) {
    let text = match value {
        Value::Null => return,
        Value::String(s) if s.is_empty() => return,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        nested => nested.to_string(),
    };
    pairs.push(format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(&text)
    ));
}

/// Ordered parameter set for callers that build queries field by field.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Map<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_query_string().is_empty()
    }

    pub fn to_query_string(&self) -> String {
        build_query_from_map(&self.0)
    }

    /// Append the query to `path`, leaving it untouched when nothing survives filtering.
    pub fn apply_to(&self, path: &str) -> String {
        with_query(path, &self.to_query_string())
    }
}

impl From<QueryParams> for Value {
    fn from(params: QueryParams) -> Self {
        Value::Object(params.0)
    }
}

/// `path?query`, or just `path` when `query` is empty.
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else if path.contains('?') {
        format!("{path}&{query}")
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_without_segments_keeps_base() {
        assert_eq!(join_path("/client", Vec::<Segment>::new()), "/client");
        assert_eq!(join_path("client", Vec::<Segment>::new()), "/client");
    }

    #[test]
    fn join_mixed_segments() {
        let path = join_path("/client", [Segment::from(5), Segment::from("update")]);
        assert_eq!(path, "/client/5/update");
    }

    #[test]
    fn join_skips_missing_segments() {
        let id: Option<i64> = None;
        let path = join_path("/vehicle", [Segment::from(id), Segment::from("plate"), Segment::from(Some(7i64))]);
        assert_eq!(path, "/vehicle/plate/7");
    }

    #[test]
    fn join_is_stable_on_normalized_input() {
        let once = join_path("/client", [Segment::from(5)]);
        assert_eq!(join_path(&once, Vec::<Segment>::new()), once);
    }

    #[test]
    fn endpoint_macro_accepts_mixed_types() {
        let id: i64 = 5;
        assert_eq!(crate::endpoint!("/client", id, "update"), "/client/5/update");
        assert_eq!(crate::endpoint!("/client"), "/client");
        assert_eq!(crate::endpoint!("/client-vehicle", "client", None::<i64>, 3u32), "/client-vehicle/client/3");
    }

    #[test]
    fn query_drops_empty_values_and_repeats_arrays() {
        let params = json!({ "a": [1, 2], "b": "", "c": null, "d": "x" });
        assert_eq!(build_query(&params), "a=1&a=2&d=x");
    }

    #[test]
    fn query_encodes_keys_and_values() {
        let params = json!({ "search": "Juan Pérez", "tags[]": "a&b" });
        assert_eq!(build_query(&params), "search=Juan%20P%C3%A9rez&tags%5B%5D=a%26b");
    }

    #[test]
    fn query_of_non_object_is_empty() {
        assert_eq!(build_query(&json!([1, 2])), "");
        assert_eq!(build_query(&Value::Null), "");
    }

    #[test]
    fn query_params_builder_keeps_insertion_order() {
        let params = QueryParams::new()
            .push("page", 2)
            .push("status", vec!["pending", "completed"])
            .push("search", "");
        assert_eq!(params.to_query_string(), "page=2&status=pending&status=completed");
        assert_eq!(params.apply_to("/reservation"), "/reservation?page=2&status=pending&status=completed");
        assert!(QueryParams::new().push("q", Value::Null).is_empty());
    }

    #[test]
    fn with_query_appends_to_existing_query() {
        assert_eq!(with_query("/client?x=1", "y=2"), "/client?x=1&y=2");
        assert_eq!(with_query("/client", ""), "/client");
    }
}
