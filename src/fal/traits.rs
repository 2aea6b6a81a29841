use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Bytes headed for provider storage. Held in memory for the duration of the
/// upload call only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Payload of a finished provider job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    pub request_id: String,
    pub data: Value,
}

#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Stores the file and returns a durable URL for it.
    async fn upload(&self, file: UploadFile) -> Result<String>;

    /// Submits a job and waits until it completes or fails.
    async fn subscribe(&self, endpoint: &str, arguments: Value) -> Result<JobOutput>;
}
