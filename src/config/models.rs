//! Configuration data structures for the action server.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. They are
//! intentionally serde‑friendly and include defaults so that minimal configs remain concise.
use std::time::Duration;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Execution pool the actions are scheduled on
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Worker threads of a dedicated pool. Unset means "run on the server runtime".
    pub worker_threads: Option<usize>,
    /// Name given to the dedicated pool's threads
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "action-pool".to_string(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "actionkit=debug,tower_http=info"
    pub level: String,
    /// Emit JSON lines instead of pretty console output
    pub json: bool,
    /// Include span context in JSON output
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            include_spans: true,
        }
    }
}

/// Timings of the demo streaming endpoints. Durations are humantime strings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StreamingConfig {
    /// Period between two Server-Sent-Events
    pub tick_interval: String,
    /// Deadline after which a live SSE stream is cancelled
    pub cancel_after: String,
    /// Period between two WebSocket messages
    pub websocket_interval: String,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            tick_interval: "1s".to_string(),
            cancel_after: "5s".to_string(),
            websocket_interval: "1s".to_string(),
        }
    }
}

impl StreamingConfig {
    pub fn tick_interval(&self) -> Result<Duration> {
        parse_duration("streaming.tick_interval", &self.tick_interval)
    }

    pub fn cancel_after(&self) -> Result<Duration> {
        parse_duration("streaming.cancel_after", &self.cancel_after)
    }

    pub fn websocket_interval(&self) -> Result<Duration> {
        parse_duration("streaming.websocket_interval", &self.websocket_interval)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .wrap_err_with(|| format!("Invalid duration for {field}: '{value}'"))
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            executor: ExecutorConfig::default(),
            logging: LoggingConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

/// Builder for ServerConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ServerConfigBuilder {
    listen_addr: Option<String>,
    executor: Option<ExecutorConfig>,
    logging: Option<LoggingConfig>,
    streaming: Option<StreamingConfig>,
}

impl ServerConfigBuilder {
    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Run actions on a dedicated pool with `worker_threads` threads
    pub fn worker_threads(mut self, worker_threads: usize) -> Self {
        let mut executor = self.executor.unwrap_or_default();
        executor.worker_threads = Some(worker_threads);
        self.executor = Some(executor);
        self
    }

    /// Set execution pool configuration
    pub fn executor(mut self, config: ExecutorConfig) -> Self {
        self.executor = Some(config);
        self
    }

    /// Set logging configuration
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Set streaming configuration
    pub fn streaming(mut self, config: StreamingConfig) -> Self {
        self.streaming = Some(config);
        self
    }

    /// Build the final ServerConfig
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            executor: self.executor.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            streaming: self.streaming.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert!(config.executor.worker_threads.is_none());
        assert_eq!(config.streaming.tick_interval().unwrap(), Duration::from_secs(1));
        assert_eq!(config.streaming.cancel_after().unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::builder()
            .listen_addr("0.0.0.0:9000")
            .worker_threads(4)
            .build();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.executor.worker_threads, Some(4));
        assert_eq!(config.executor.thread_name, "action-pool");
    }

    #[test]
    fn test_invalid_duration() {
        let streaming = StreamingConfig {
            tick_interval: "soon".to_string(),
            ..StreamingConfig::default()
        };
        let err = streaming.tick_interval().unwrap_err();
        assert!(err.to_string().contains("streaming.tick_interval"));
    }
}
