//! In-memory provider that records every call.

use super::traits::{JobOutput, MediaProvider, UploadFile};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

type Predicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;
type DelayFn = Box<dyn Fn(&Value) -> Duration + Send + Sync>;

#[derive(Default)]
pub(crate) struct MockProvider {
    pub uploads: Mutex<Vec<UploadFile>>,
    pub calls: Mutex<Vec<(String, Value)>>,
    fail_when: Option<Predicate>,
    delay: Option<DelayFn>,
    fail_uploads: bool,
    without_images: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_when(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn delayed_by(mut self, delay: impl Fn(&Value) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn without_images(mut self) -> Self {
        self.without_images = true;
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProvider for MockProvider {
    async fn upload(&self, file: UploadFile) -> Result<String> {
        if self.fail_uploads {
            return Err(GatewayError::UploadFailed("storage unavailable".into()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        let url = format!("https://storage.test/{}/{}", uploads.len(), file.file_name);
        uploads.push(file);
        Ok(url)
    }

    async fn subscribe(&self, endpoint: &str, arguments: Value) -> Result<JobOutput> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((endpoint.to_string(), arguments.clone()));
            calls.len() - 1
        };

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(&arguments)).await;
        }

        if let Some(predicate) = &self.fail_when {
            if predicate(&arguments) {
                return Err(GatewayError::ResponseError(format!(
                    "mock failure for call {}",
                    index
                )));
            }
        }

        let images = if self.without_images {
            json!([])
        } else {
            json!([{ "url": format!("https://out.test/{}.png", index) }])
        };

        Ok(JobOutput {
            request_id: format!("req-{}", index),
            data: json!({
                "images": images,
                "video": { "url": format!("https://out.test/{}.mp4", index) },
            }),
        })
    }
}
