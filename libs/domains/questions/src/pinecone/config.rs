use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};
use std::fmt;

use crate::models::ServerlessSpec;

pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_API_VERSION: &str = "2024-07";

/// Pinecone connection configuration
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    pub controller_url: String,
    /// Data-plane host. Resolved from the control plane when unset.
    pub index_host: Option<String>,
    pub api_version: String,
    pub serverless: ServerlessSpec,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn new(api_key: String, index_name: String) -> Self {
        Self {
            api_key,
            index_name,
            controller_url: DEFAULT_CONTROLLER_URL.to_string(),
            index_host: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            serverless: ServerlessSpec::default(),
            timeout_secs: 30,
        }
    }

    pub fn with_controller_url(mut self, url: String) -> Self {
        self.controller_url = url;
        self
    }

    pub fn with_index_host(mut self, host: String) -> Self {
        self.index_host = Some(host);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("controller_url", &self.controller_url)
            .field("index_host", &self.index_host)
            .field("api_version", &self.api_version)
            .field("serverless", &self.serverless)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FromEnv for PineconeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = ServerlessSpec::default();

        let mut config = Self::new(
            env_required("PINECONE_API_KEY")?,
            env_required("PINECONE_INDEX")?,
        )
        .with_controller_url(env_or_default(
            "PINECONE_CONTROLLER_URL",
            DEFAULT_CONTROLLER_URL,
        ))
        .with_timeout(env_parse_or("PINECONE_TIMEOUT_SECS", 30)?);

        if let Some(host) = std::env::var("PINECONE_INDEX_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
        {
            config = config.with_index_host(host);
        }

        config.api_version = env_or_default("PINECONE_API_VERSION", DEFAULT_API_VERSION);
        config.serverless = ServerlessSpec {
            cloud: env_or_default("PINECONE_CLOUD", &defaults.cloud),
            region: env_or_default("PINECONE_REGION", &defaults.region),
        };
        Ok(config)
    }
}
