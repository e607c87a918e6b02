use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse_or, server::ServerConfig,
};
use domain_questions::{EmbeddingModel, OpenAIConfig, PineconeConfig, ProvisionConfig};
use std::time::Duration;

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub openai: OpenAIConfig,
    pub pinecone: PineconeConfig,
    pub embedding_model: EmbeddingModel,
    pub provisioning: ProvisionConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=127.0.0.1, PORT=5000 by default
        let openai = OpenAIConfig::from_env()?; // OPENAI_API_KEY required
        let pinecone = PineconeConfig::from_env()?; // PINECONE_API_KEY, PINECONE_INDEX required

        let default_model = EmbeddingModel::default();
        let embedding_model = env_or_default("EMBEDDING_MODEL", default_model.model_name())
            .parse::<EmbeddingModel>()
            .map_err(|details| ConfigError::ParseError {
                key: "EMBEDDING_MODEL".to_string(),
                details,
            })?;

        let provisioning = ProvisionConfig::new(
            pinecone.index_name.clone(),
            embedding_model.dimension(),
            pinecone.serverless.clone(),
        )
        .with_poll_interval(Duration::from_millis(env_parse_or(
            "INDEX_READY_POLL_MS",
            1000,
        )?))
        .with_ready_timeout(Duration::from_secs(env_parse_or(
            "INDEX_READY_TIMEOUT_SECS",
            120,
        )?));

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            openai,
            pinecone,
            embedding_model,
            provisioning,
        })
    }
}
