//! Query string parameters sent along with model and collection requests.

use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// A single query string value.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum QueryValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    String(String),
}

impl QueryValue {
    /// Lists are rendered as comma-joined strings, e.g. `[1, 2, 3]` becomes `"1,2,3"`.
    pub fn list<T: Display>(items: impl IntoIterator<Item = T>) -> Self {
        QueryValue::String(items.into_iter().join(","))
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        QueryValue::U64(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::U64(value.into())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::I64(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::F64(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::String(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::String(value.to_string())
    }
}

impl From<crate::types::ModelId> for QueryValue {
    fn from(value: crate::types::ModelId) -> Self {
        QueryValue::U64(value.0)
    }
}

impl<T: Display> From<Vec<T>> for QueryValue {
    fn from(value: Vec<T>) -> Self {
        QueryValue::list(value)
    }
}

impl Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryValue::U64(v) => v.fmt(f),
            QueryValue::I64(v) => v.fmt(f),
            QueryValue::F64(v) => v.fmt(f),
            QueryValue::Bool(v) => v.fmt(f),
            QueryValue::String(v) => v.fmt(f),
        }
    }
}

/// Query string parameters, serialized with `reqwest::RequestBuilder::query`.
pub type QueryParameters = BTreeMap<String, QueryValue>;
