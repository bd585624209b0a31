use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::GatewayError;
use crate::rows::QueryResult;
use crate::{CrmGateway, SqlParam};

const USER_AGENT: &str = "hirelane/0.1 (campaign-portal)";

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    sql: &'a str,
    params: &'a [SqlParam],
}

/// HTTP implementation of [`CrmGateway`].
///
/// Posts `{"sql", "params"}` to `{base}/api/query` with an optional bearer
/// token. No retries: every statement is executed at most once, so a slow
/// gateway cannot turn one insert into several.
pub struct HttpCrmGateway {
    client: Client,
    query_url: String,
    token: Option<String>,
}

impl HttpCrmGateway {
    /// Creates a gateway client with configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidBaseUrl`] for an empty base URL, or
    /// [`GatewayError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(GatewayError::InvalidBaseUrl {
                base_url: base_url.to_string(),
                reason: "base URL is empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            query_url: format!("{trimmed}/api/query"),
            token,
        })
    }
}

#[async_trait]
impl CrmGateway for HttpCrmGateway {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, GatewayError> {
        let mut request = self
            .client
            .post(&self.query_url)
            .json(&QueryRequest { sql, params });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "CRM gateway returned an error");
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<QueryResult>(&body)
            .map_err(|source| GatewayError::Decode { source })
    }
}
