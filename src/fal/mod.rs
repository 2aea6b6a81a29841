pub mod queue_client;
pub mod storage_client;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

use crate::{
    config::FalConfig,
    error::{GatewayError, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub use queue_client::QueueClient;
pub use storage_client::StorageClient;
pub use traits::{JobOutput, MediaProvider, UploadFile};

pub const MISSING_CREDENTIAL: &str = "FAL_API_KEY not configured";

#[derive(Clone)]
pub struct FalClient {
    storage_client: StorageClient,
    queue_client: QueueClient,
}

impl FalClient {
    pub fn new(config: &FalConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GatewayError::ConfigError(MISSING_CREDENTIAL.into()))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            storage_client: StorageClient::new(http.clone(), config.rest_url.clone(), &api_key),
            queue_client: QueueClient::new(
                http,
                config.queue_url.clone(),
                &api_key,
                config.poll_interval,
                config.job_timeout,
            ),
        })
    }
}

#[async_trait]
impl MediaProvider for FalClient {
    async fn upload(&self, file: UploadFile) -> Result<String> {
        self.storage_client.upload(file).await
    }

    async fn subscribe(&self, endpoint: &str, arguments: Value) -> Result<JobOutput> {
        self.queue_client.subscribe(endpoint, arguments).await
    }
}

/// Pulls a readable message out of a failed provider response.
pub(crate) async fn read_error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => match map.get("detail").or_else(|| map.get("error")) {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => text,
        },
        _ => text,
    }
}
