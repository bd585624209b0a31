use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base URL of the CRM SQL gateway that executes queries on our behalf.
    pub crm_base_url: String,
    /// Optional bearer token for the CRM gateway.
    pub crm_api_token: Option<String>,
    pub crm_request_timeout_secs: u64,
    /// SQLite file backing the persistent key-value cache.
    pub store_path: PathBuf,
    /// Directory holding the built single-page app served for non-API paths.
    pub static_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("crm_base_url", &self.crm_base_url)
            .field(
                "crm_api_token",
                &self.crm_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("crm_request_timeout_secs", &self.crm_request_timeout_secs)
            .field("store_path", &self.store_path)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}
