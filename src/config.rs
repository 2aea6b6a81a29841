use std::env;
use std::time::Duration;

pub const DEFAULT_EDIT_MODEL: &str = "fal-ai/bytedance/seedream/v4.5/edit";
pub const DEFAULT_TEXT_TO_IMAGE_MODEL: &str = "fal-ai/bytedance/seedream/v4.5/text-to-image";
pub const DEFAULT_VIDEO_MODEL: &str = "fal-ai/bytedance/seedance/v1/pro/image-to-video";
/// Hosts (and their subdomains) the pass-through proxy may send the credential to.
pub const DEFAULT_PROXY_HOSTS: [&str; 3] = ["fal.run", "fal.ai", "fal.media"];

#[derive(Debug, Clone)]
pub struct FalModels {
    pub edit: String,
    pub text_to_image: String,
    pub image_to_video: String,
}

impl Default for FalModels {
    fn default() -> Self {
        FalModels {
            edit: DEFAULT_EDIT_MODEL.to_string(),
            text_to_image: DEFAULT_TEXT_TO_IMAGE_MODEL.to_string(),
            image_to_video: DEFAULT_VIDEO_MODEL.to_string(),
        }
    }
}

impl FalModels {
    pub fn from_env() -> Self {
        let defaults = FalModels::default();
        FalModels {
            edit: non_empty_env("FAL_EDIT_MODEL").unwrap_or(defaults.edit),
            text_to_image: non_empty_env("FAL_TEXT_TO_IMAGE_MODEL")
                .unwrap_or(defaults.text_to_image),
            image_to_video: non_empty_env("FAL_VIDEO_MODEL").unwrap_or(defaults.image_to_video),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FalConfig {
    pub api_key: Option<String>,
    pub queue_url: String,
    pub rest_url: String,
    pub poll_interval: Duration,
    pub job_timeout: Duration,
    pub proxy_timeout: Duration,
    /// Empty means any host.
    pub proxy_hosts: Vec<String>,
    pub models: FalModels,
}

impl Default for FalConfig {
    fn default() -> Self {
        FalConfig {
            api_key: None,
            queue_url: "https://queue.fal.run".to_string(),
            rest_url: "https://rest.alpha.fal.ai".to_string(),
            poll_interval: Duration::from_millis(500),
            job_timeout: Duration::from_secs(900),
            proxy_timeout: Duration::from_secs(300),
            proxy_hosts: DEFAULT_PROXY_HOSTS.iter().map(|h| h.to_string()).collect(),
            models: FalModels::default(),
        }
    }
}

impl FalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = FalConfig::default();
        let api_key = non_empty_env("FAL_API_KEY").or_else(|| non_empty_env("FAL_KEY"));

        FalConfig {
            api_key,
            queue_url: non_empty_env("FAL_QUEUE_URL")
                .map(trim_base_url)
                .unwrap_or(defaults.queue_url),
            rest_url: non_empty_env("FAL_REST_URL")
                .map(trim_base_url)
                .unwrap_or(defaults.rest_url),
            poll_interval: env_parse::<u64>("FAL_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            job_timeout: env_parse::<u64>("FAL_JOB_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_timeout),
            proxy_timeout: env_parse::<u64>("FAL_PROXY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.proxy_timeout),
            proxy_hosts: non_empty_env("FAL_PROXY_ALLOWED_HOSTS")
                .map(|value| parse_host_list(&value))
                .unwrap_or(defaults.proxy_hosts),
            models: FalModels::from_env(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_queue_url(mut self, url: impl Into<String>) -> Self {
        self.queue_url = trim_base_url(url.into());
        self
    }

    pub fn with_rest_url(mut self, url: impl Into<String>) -> Self {
        self.rest_url = trim_base_url(url.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_proxy_timeout(mut self, timeout: Duration) -> Self {
        self.proxy_timeout = timeout;
        self
    }

    pub fn with_proxy_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxy_hosts = hosts
            .into_iter()
            .map(|host| host.into().trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        self
    }

    /// Whether the proxy may forward to `host`: an exact match or a subdomain
    /// of an allowed entry.
    pub fn allows_proxy_host(&self, host: &str) -> bool {
        if self.proxy_hosts.is_empty() {
            return true;
        }
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.proxy_hosts.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn with_models(mut self, models: FalModels) -> Self {
        self.models = models;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub fal: FalConfig,
    pub batch_concurrency: usize,
    pub max_body_bytes: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 8080,
            fal: FalConfig::default(),
            batch_concurrency: 1,
            max_body_bytes: 50 * 1024 * 1024,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Config::default();
        let log_format = match non_empty_env("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Config {
            host: non_empty_env("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            fal: FalConfig::from_env(),
            batch_concurrency: env_parse::<usize>("BATCH_CONCURRENCY")
                .unwrap_or(defaults.batch_concurrency)
                .max(1),
            max_body_bytes: env_parse::<usize>("MAX_BODY_MB")
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_body_bytes),
            log_level: non_empty_env("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_fal(mut self, config: FalConfig) -> Self {
        self.fal = config;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit.max(1);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    non_empty_env(key).and_then(|value| value.parse().ok())
}

/// `FAL_PROXY_ALLOWED_HOSTS`: comma-separated hosts, `*` for any.
fn parse_host_list(value: &str) -> Vec<String> {
    if value.trim() == "*" {
        return Vec::new();
    }
    value
        .split(',')
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.batch_concurrency, 1);
        assert!(!config.fal.has_credentials());
        assert_eq!(config.fal.models.edit, DEFAULT_EDIT_MODEL);
        assert_eq!(config.fal.models.text_to_image, DEFAULT_TEXT_TO_IMAGE_MODEL);
        assert_eq!(config.fal.models.image_to_video, DEFAULT_VIDEO_MODEL);
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_port(9000)
            .with_batch_concurrency(0)
            .with_fal(FalConfig::new().with_api_key("key").with_queue_url("http://localhost:1/"));

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.batch_concurrency, 1);
        assert!(config.fal.has_credentials());
        assert_eq!(config.fal.queue_url, "http://localhost:1");
    }

    #[test]
    fn test_proxy_host_allowlist() {
        let fal = FalConfig::new();
        assert!(fal.allows_proxy_host("queue.fal.run"));
        assert!(fal.allows_proxy_host("fal.ai"));
        assert!(fal.allows_proxy_host("v3.FAL.media"));
        assert!(!fal.allows_proxy_host("evilfal.run"));
        assert!(!fal.allows_proxy_host("fal.run.attacker.test"));
        assert!(!fal.allows_proxy_host("127.0.0.1"));

        let open = FalConfig::new().with_proxy_hosts(Vec::<String>::new());
        assert!(open.allows_proxy_host("127.0.0.1"));

        assert_eq!(parse_host_list(" *"), Vec::<String>::new());
        assert_eq!(parse_host_list("fal.run, Example.test,"), vec!["fal.run", "example.test"]);
    }
}
