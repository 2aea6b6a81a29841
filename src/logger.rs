use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Instant;
use uuid::Uuid;

use crate::config::{Config, LogFormat};

static GATEWAY_LOGGER: Lazy<GatewayLogger> = Lazy::new(GatewayLogger::new);

/// Crate prefix; records from any other target count as dependency output.
const CRATE_TARGET: &str = "seedream_gateway";
/// actix-web's access log. Shown like our own records.
const ACCESS_LOG_TARGET: &str = "actix_web::middleware::logger";

/// Installs the logger. Calling it again only swaps the configuration.
pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = config.min_level.filter();
    GATEWAY_LOGGER.update_config(config);

    if log::set_logger(&*GATEWAY_LOGGER).is_err() {
        log::debug!("Logger already installed, configuration updated");
    }

    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Label, emoji and colour used by the console format.
    pub fn style(&self) -> (&'static str, &'static str, Color) {
        match self {
            LogLevel::Trace => ("TRACE", "🔍", Color::Cyan),
            LogLevel::Debug => ("DEBUG", "🐛", Color::Blue),
            LogLevel::Info => ("INFO", "💡", Color::Green),
            LogLevel::Warn => ("WARN", "⚠️", Color::Yellow),
            LogLevel::Error => ("ERROR", "❌", Color::Red),
        }
    }

    /// Parses `LOG_LEVEL` values; unknown names fall back to `Info`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One emitted line; serialized as-is in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LogEntry {
    fn from_record(record: &Record, with_location: bool) -> Self {
        let location = match (with_location, record.file(), record.line()) {
            (true, Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        };

        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().into(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            location,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    /// Threshold for records from dependencies (hyper, reqwest, actix-server).
    pub dependency_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_location: bool,
    pub show_target: bool,
    pub timestamp_format: String,
    pub output_json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            dependency_level: LogLevel::Warn,
            show_colors: true,
            show_emojis: true,
            show_location: false,
            show_target: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the logger settings from `LOG_LEVEL` / `LOG_FORMAT`.
    pub fn from_config(config: &Config) -> Self {
        let base = match config.log_format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::default(),
        };
        let level = LogLevel::parse(&config.log_level);
        let mut logger_config = base.with_level(level);
        if level == LogLevel::Trace {
            logger_config.dependency_level = LogLevel::Trace;
            logger_config.show_location = true;
        }
        logger_config
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    /// Machine-readable lines for log shippers.
    pub fn production() -> Self {
        Self {
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    fn allows(&self, level: Level, target: &str) -> bool {
        let level = LogLevel::from(level);
        if target.starts_with(CRATE_TARGET) || target == ACCESS_LOG_TARGET {
            level >= self.min_level
        } else {
            level >= self.min_level.max(self.dependency_level)
        }
    }
}

pub struct GatewayLogger {
    config: Mutex<LoggerConfig>,
}

impl GatewayLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
        let (label, emoji, color) = entry.level.style();
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = if config.show_emojis {
            format!("[{} {}]", emoji, label)
        } else {
            format!("[{}]", label)
        };

        let mut parts = Vec::with_capacity(5);
        if config.show_colors {
            parts.push(timestamp.bright_black().to_string());
            parts.push(level.color(color).bold().to_string());
        } else {
            parts.push(timestamp);
            parts.push(level);
        }

        let message = if config.show_target {
            format!("{}: {}", entry.target, entry.message)
        } else {
            entry.message.clone()
        };
        parts.push(message);

        if let Some(location) = &entry.location {
            let location = format!("({})", location);
            parts.push(if config.show_colors {
                location.bright_black().to_string()
            } else {
                location
            });
        }

        parts.join(" ")
    }
}

impl Default for GatewayLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for GatewayLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => config.allows(metadata.level(), metadata.target()),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        let Ok(config) = self.config.lock() else {
            return;
        };
        if !config.allows(record.level(), record.target()) {
            return;
        }

        let entry = LogEntry::from_record(record, config.show_location);
        let line = if config.output_json {
            serde_json::to_string(&entry).unwrap_or_default()
        } else {
            Self::format_line(&entry, &config)
        };

        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Measures a provider call; logs the elapsed time when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  {} finished in {}ms",
            self.name,
            self.start.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    log::debug!("⏱️  Starting: {}", name);
    Timer {
        start: Instant::now(),
        name: name.to_string(),
    }
}

/// Startup banner. Reports whether the credential is present, never its value.
pub fn log_startup_info(app_name: &str, version: &str, config: &Config) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!("🌐 Binding http://{}", config.bind_address());
    log::info!(
        "🔑 FAL credential: {}",
        if config.fal.has_credentials() { "present" } else { "missing" }
    );
    log::info!(
        "🧠 Models: edit={} text_to_image={} video={}",
        config.fal.models.edit,
        config.fal.models.text_to_image,
        config.fal.models.image_to_video
    );
    log::info!(
        "🧩 Batch concurrency {}, body limit {} bytes",
        config.batch_concurrency,
        config.max_body_bytes
    );
}
