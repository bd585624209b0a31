use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from CRM gateway")]
    UnexpectedStatus { status: u16 },

    #[error("could not decode CRM gateway response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid gateway base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
