use crate::{
    error::{GatewayError, Result},
    fal::{read_error_body, traits::JobOutput},
    logger,
};
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize)]
struct QueueSubmission {
    request_id: String,
    #[serde(default)]
    status_url: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueLog {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueueStatus {
    status: String,
    #[serde(default)]
    queue_position: Option<u64>,
    #[serde(default)]
    logs: Option<Vec<QueueLog>>,
    #[serde(default)]
    error: Option<Value>,
}

/// Queue-backed job runner: submit, poll the status URL, then fetch the result.
#[derive(Clone)]
pub struct QueueClient {
    http: Client,
    queue_url: String,
    api_key: String,
    poll_interval: Duration,
    job_timeout: Duration,
}

impl QueueClient {
    pub fn new(
        http: Client,
        queue_url: impl Into<String>,
        api_key: impl Into<String>,
        poll_interval: Duration,
        job_timeout: Duration,
    ) -> Self {
        Self {
            http,
            queue_url: queue_url.into(),
            api_key: api_key.into(),
            poll_interval,
            job_timeout,
        }
    }

    pub async fn subscribe(&self, endpoint: &str, arguments: Value) -> Result<JobOutput> {
        let _timer = logger::timer(&format!("fal job {}", endpoint));

        let submission = self.submit(endpoint, &arguments).await?;
        log::info!(
            "🧾 Submitted {} as request {}",
            endpoint,
            submission.request_id
        );

        let status_url = submission
            .status_url
            .clone()
            .unwrap_or_else(|| self.request_url(endpoint, &submission.request_id, "/status"));
        let response_url = submission
            .response_url
            .clone()
            .unwrap_or_else(|| self.request_url(endpoint, &submission.request_id, ""));

        self.wait_for_completion(&submission.request_id, &status_url)
            .await?;
        let data = self.fetch_result(&response_url).await?;

        Ok(JobOutput {
            request_id: submission.request_id,
            data,
        })
    }

    async fn submit(&self, endpoint: &str, arguments: &Value) -> Result<QueueSubmission> {
        let url = format!("{}/{}", self.queue_url, endpoint.trim_start_matches('/'));
        log::debug!("Queue submission payload for {}: {}", endpoint, arguments);

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.auth_header())
            .json(arguments)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_error_body(response).await;
            return Err(GatewayError::ResponseError(format!(
                "Job submission to {} failed ({}): {}",
                endpoint, status, body
            )));
        }

        response
            .json::<QueueSubmission>()
            .await
            .map_err(|e| GatewayError::ResponseError(format!("Invalid queue response: {}", e)))
    }

    async fn wait_for_completion(&self, request_id: &str, status_url: &str) -> Result<()> {
        let started = Instant::now();
        let mut seen_logs = 0usize;

        loop {
            let response = self
                .http
                .get(status_url)
                .query(&[("logs", "1")])
                .header(AUTHORIZATION, self.auth_header())
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = read_error_body(response).await;
                return Err(GatewayError::ResponseError(format!(
                    "Status check for {} failed ({}): {}",
                    request_id, status, body
                )));
            }

            let status: QueueStatus = response.json().await.map_err(|e| {
                GatewayError::ResponseError(format!("Invalid status response: {}", e))
            })?;

            if let Some(logs) = &status.logs {
                for line in logs.iter().skip(seen_logs) {
                    log::debug!("[{}] {}", request_id, line.message);
                }
                seen_logs = seen_logs.max(logs.len());
            }

            match status.status.as_str() {
                "COMPLETED" => {
                    return match status.error.filter(|e| !e.is_null()) {
                        Some(error) => Err(GatewayError::ResponseError(error_text(&error))),
                        None => Ok(()),
                    };
                }
                "IN_QUEUE" => {
                    if let Some(position) = status.queue_position {
                        log::debug!("[{}] queue position {}", request_id, position);
                    }
                }
                "IN_PROGRESS" => {}
                other => {
                    return Err(GatewayError::ResponseError(format!(
                        "Unexpected status {} for request {}",
                        other, request_id
                    )));
                }
            }

            if started.elapsed() >= self.job_timeout {
                return Err(GatewayError::ResponseError(format!(
                    "Request {} did not complete within {}s",
                    request_id,
                    self.job_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn fetch_result(&self, response_url: &str) -> Result<Value> {
        let response = self
            .http
            .get(response_url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = read_error_body(response).await;
            return Err(GatewayError::ResponseError(format!(
                "Job failed ({}): {}",
                status, body
            )));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Status and result URLs live under the owner/app root, not the full
    /// endpoint path.
    fn request_url(&self, endpoint: &str, request_id: &str, suffix: &str) -> String {
        format!(
            "{}/{}/requests/{}{}",
            self.queue_url,
            app_root(endpoint),
            request_id,
            suffix
        )
    }

    fn auth_header(&self) -> String {
        format!("Key {}", self.api_key)
    }
}

/// `fal-ai/bytedance/seedream/v4.5/edit` -> `fal-ai/bytedance`
pub fn app_root(endpoint: &str) -> String {
    endpoint
        .trim_matches('/')
        .split('/')
        .take(2)
        .collect::<Vec<_>>()
        .join("/")
}

fn error_text(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}
