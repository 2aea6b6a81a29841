use crate::{
    error::{GatewayError, Result},
    fal::{read_error_body, traits::UploadFile},
};
use reqwest::{header::AUTHORIZATION, header::CONTENT_TYPE, Client};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: String,
    file_url: String,
}

/// Two-step upload into fal storage: initiate to obtain a signed target, then
/// PUT the bytes there.
#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    rest_url: String,
    api_key: String,
}

impl StorageClient {
    pub fn new(http: Client, rest_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            rest_url: rest_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn upload(&self, file: UploadFile) -> Result<String> {
        let initiate_url = format!(
            "{}/storage/upload/initiate?storage_type=fal-cdn-v3",
            self.rest_url
        );

        log::debug!(
            "Initiating upload of {} ({} bytes, {})",
            file.file_name,
            file.bytes.len(),
            file.content_type
        );

        let response = self
            .http
            .post(&initiate_url)
            .header(AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&json!({
                "content_type": file.content_type,
                "file_name": file.file_name,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::UploadFailed(format!("initiate request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_error_body(response).await;
            return Err(GatewayError::UploadFailed(format!(
                "initiate returned {}: {}",
                status, body
            )));
        }

        let ticket: UploadTicket = response
            .json()
            .await
            .map_err(|e| GatewayError::UploadFailed(format!("invalid initiate response: {}", e)))?;

        let response = self
            .http
            .put(&ticket.upload_url)
            .header(CONTENT_TYPE, file.content_type)
            .body(file.bytes)
            .send()
            .await
            .map_err(|e| GatewayError::UploadFailed(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_error_body(response).await;
            return Err(GatewayError::UploadFailed(format!(
                "storage returned {}: {}",
                status, body
            )));
        }

        log::info!("📤 Uploaded {} -> {}", file.file_name, ticket.file_url);
        Ok(ticket.file_url)
    }
}
