//! Document queries: equality filters on JSON paths plus an optional sort.
//!
//! Both backends share [`Query::matches`] and [`Query::order`] so that
//! filtering and ordering behave identically in memory and in Postgres.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Dotted path into the serialized document (e.g. `createdAt`).
    pub path: String,
    pub direction: SortDirection,
}

/// Filter + sort over a collection.
///
/// Paths use the serialized (camelCase) field names; nested fields are joined
/// with dots (`ratings.average`). A `null` filter value matches a missing or
/// null field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, JsonValue)>,
    pub sort: Vec<SortKey>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push((path.into(), value.into()));
        self
    }

    /// Add a filter only when `value` is present.
    pub fn filter_opt<V: Into<JsonValue>>(self, path: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.filter(path, v),
            None => self,
        }
    }

    pub fn sort_by(mut self, path: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey {
            path: path.into(),
            direction,
        });
        self
    }

    pub fn matches(&self, body: &JsonValue) -> bool {
        self.filters.iter().all(|(path, expected)| match lookup(body, path) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }

    /// Compare two documents by the sort keys (equal when there are none).
    pub fn order(&self, a: &JsonValue, b: &JsonValue) -> Ordering {
        for key in &self.sort {
            let ord = compare_values(lookup(a, &key.path), lookup(b, &key.path));
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Filter and stably sort serialized documents.
    pub fn apply(&self, bodies: impl IntoIterator<Item = JsonValue>) -> Vec<JsonValue> {
        let mut out: Vec<JsonValue> = bodies.into_iter().filter(|b| self.matches(b)).collect();
        if !self.sort.is_empty() {
            out.sort_by(|a, b| self.order(a, b));
        }
        out
    }

    /// Nested JSON object equivalent of the non-null filters, usable with
    /// Postgres' `@>` containment operator.
    pub fn containment(&self) -> JsonValue {
        let mut root = Map::new();
        for (path, value) in &self.filters {
            if value.is_null() {
                continue;
            }
            let segments: Vec<&str> = path.split('.').collect();
            insert_path(&mut root, &segments, value.clone());
        }
        JsonValue::Object(root)
    }
}

fn insert_path(map: &mut Map<String, JsonValue>, segments: &[&str], value: JsonValue) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry((*head).to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !child.is_object() {
                *child = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(inner) = child {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Resolve a dotted path inside a JSON document.
pub fn lookup<'a>(body: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(body, |node, segment| node.get(segment))
}

/// Total order over JSON scalars used for sorting.
///
/// Missing and null sort first. Strings that both parse as RFC 3339
/// timestamps compare chronologically.
pub fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x).map(|d| d.with_timezone(&Utc)),
                DateTime::parse_from_rfc3339(y).map(|d| d.with_timezone(&Utc)),
            ) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
