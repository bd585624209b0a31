//! Normalization of the CRM gateway's polymorphic query results.
//!
//! The gateway returns rows in one of several shapes depending on the query
//! and gateway version:
//!
//! - a bare JSON array of flat row objects;
//! - an envelope `{"status": "...", "data": [...]}` with the rows inside;
//! - either of the above with each row's fields nested one level under a key
//!   equal to the physical table name, and joined/computed columns nested
//!   under positional numeric keys (`"0"`, `"1"`, ...).
//!
//! Everything downstream consumes [`Row`], which tries the nested shapes
//! before direct access and reports absent fields as `None` — never as an
//! error. This is the single seam keeping repositories storage-shape
//! agnostic; no call site re-implements shape sniffing.

use serde::Deserialize;
use serde_json::Value;

/// Decoded result of one gateway query.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    Envelope {
        status: Option<String>,
        #[serde(default)]
        data: Vec<Value>,
    },
    Rows(Vec<Value>),
    /// Anything else (scalar, null, unexpected object) carries no rows.
    Other(Value),
}

impl QueryResult {
    #[must_use]
    pub fn rows(&self) -> &[Value] {
        match self {
            QueryResult::Envelope { data, .. } => data,
            QueryResult::Rows(rows) => rows,
            QueryResult::Other(_) => &[],
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<Row<'_>> {
        self.rows().first().map(Row::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows().iter().map(Row::new)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// The raw decoded value, for the debug passthrough mode.
    #[must_use]
    pub fn raw(&self) -> Value {
        match self {
            QueryResult::Envelope { status, data } => serde_json::json!({
                "status": status,
                "data": data,
            }),
            QueryResult::Rows(rows) => Value::Array(rows.clone()),
            QueryResult::Other(value) => value.clone(),
        }
    }
}

/// One result row, with shape-tolerant field access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    value: &'a Value,
}

impl<'a> Row<'a> {
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// Extracts a field, trying in order: nested under the physical table
    /// name, nested under any positional numeric key, then direct access.
    #[must_use]
    pub fn field(&self, table: &str, name: &str) -> Option<&'a Value> {
        let obj = self.value.as_object()?;

        if let Some(nested) = obj.get(table).and_then(Value::as_object) {
            if let Some(value) = nested.get(name) {
                return Some(value);
            }
        }

        for (key, value) in obj {
            if key.chars().all(|c| c.is_ascii_digit()) && !key.is_empty() {
                if let Some(found) = value.as_object().and_then(|nested| nested.get(name)) {
                    return Some(found);
                }
            }
        }

        obj.get(name)
    }

    /// String field; numbers are rendered to strings since the gateway is
    /// inconsistent about stringifying values.
    #[must_use]
    pub fn str_field(&self, table: &str, name: &str) -> Option<String> {
        match self.field(table, name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Integer field; accepts a JSON number or a numeric string (grouped
    /// counts come back as strings).
    #[must_use]
    pub fn i64_field(&self, table: &str, name: &str) -> Option<i64> {
        match self.field(table, name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}
