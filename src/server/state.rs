//! Shared, read-only handler state.

use crate::{
    config::Config,
    error::{GatewayError, Result},
    fal::{FalClient, MediaProvider, MISSING_CREDENTIAL},
    generation::GenerationClient,
};
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no credential was configured; every capability endpoint
    /// then answers 500.
    generator: Option<GenerationClient>,
    /// Plain client for the pass-through proxy.
    http: Client,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let provider: Option<Arc<dyn MediaProvider>> = if config.fal.has_credentials() {
            Some(Arc::new(FalClient::new(&config.fal)?))
        } else {
            None
        };
        Self::build(config, provider)
    }

    /// State backed by any provider implementation, credential check included.
    pub fn with_provider(config: Config, provider: Arc<dyn MediaProvider>) -> Result<Self> {
        let provider = config.fal.has_credentials().then_some(provider);
        Self::build(config, provider)
    }

    fn build(config: Config, provider: Option<Arc<dyn MediaProvider>>) -> Result<Self> {
        let generator = provider.map(|provider| {
            GenerationClient::new(
                provider,
                config.fal.models.clone(),
                config.batch_concurrency,
            )
        });

        let http = Client::builder()
            .timeout(config.fal.proxy_timeout)
            .build()
            .map_err(|e| GatewayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            generator,
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub fn generator(&self) -> Result<&GenerationClient> {
        self.generator
            .as_ref()
            .ok_or_else(|| GatewayError::ConfigError(MISSING_CREDENTIAL.into()))
    }

    /// Credential for the proxy's `Authorization` header.
    pub fn api_key(&self) -> Result<&str> {
        self.config
            .fal
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GatewayError::ConfigError(MISSING_CREDENTIAL.into()))
    }

    pub fn http(&self) -> &Client {
        &self.http
    }
}
