//! Client for the CRM's SQL gateway.
//!
//! All relational state lives in the external CRM; this crate is the only
//! thing that talks to it. Queries are sent with `?` placeholders and a
//! bound-parameter array — SQL text is never assembled from user input.
//! Physical table names cannot be bound and are interpolated by callers,
//! but only from the table resolver's metadata-derived or default names.

mod error;
mod http;
pub mod rows;

use async_trait::async_trait;
use serde::Serialize;

pub use error::GatewayError;
pub use http::HttpCrmGateway;
pub use rows::{QueryResult, Row};

/// One bound query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Null,
}

impl SqlParam {
    /// Text parameter from an optional string, mapping `None` and empty
    /// strings to SQL NULL (the form posts empty strings for blank fields).
    #[must_use]
    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => SqlParam::Text(s.to_string()),
            _ => SqlParam::Null,
        }
    }

    #[must_use]
    pub fn opt_int(value: Option<i64>) -> Self {
        value.map_or(SqlParam::Null, SqlParam::Int)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

/// Executes SQL statements against the CRM.
///
/// Object-safe so repositories can hold `Arc<dyn CrmGateway>`; tests script
/// a fake implementation at this seam.
#[async_trait]
pub trait CrmGateway: Send + Sync {
    /// Runs one statement and returns the decoded (shape-polymorphic)
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport failure, a non-2xx gateway
    /// response, or an undecodable body.
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, GatewayError>;
}
