// Query-string serialization.
//
// Absent values are dropped, dates are written as ISO-8601 UTC with
// millisecond precision (`2024-06-15T10:30:00.000Z`).

use chrono::{DateTime, SecondsFormat, Utc};

/// A single primitive query value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl QueryValue {
    fn encode(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}

/// Ordered mapping of query keys to optional values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(&'static str, Option<QueryValue>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key. `None` is recorded but never serialized.
    pub fn push<V: Into<QueryValue>>(mut self, key: &'static str, value: Option<V>) -> Self {
        self.entries.push((key, value.map(Into::into)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_none())
    }

    /// Serialize to `?k=v&...`, or an empty string when nothing is present.
    pub fn to_query_string(&self) -> String {
        to_query_string(&self.entries)
    }
}

/// Serialize a mapping of optional primitive values into a query string.
///
/// Keys whose value is `None` are omitted. Returns `""` when every value
/// is absent, otherwise a string beginning with `?`.
pub fn to_query_string<K: AsRef<str>>(params: &[(K, Option<QueryValue>)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        if let Some(value) = value {
            serializer.append_pair(key.as_ref(), &value.encode());
            any = true;
        }
    }
    if any {
        format!("?{}", serializer.finish())
    } else {
        String::new()
    }
}
