//! Application configuration.
//!
//! `config.toml` (path from `CONFIG_PATH`) is optional; every field has a default and can be
//! overridden from the environment. The result is validated once at startup and then passed
//! down explicitly.

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

pub const ALLOWED_ENVS: [&str; 4] = ["dev", "test", "uat", "production"];

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub opensearch: OpenSearchConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_app_env")]
    pub env: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self { name: default_app_name(), env: default_app_env() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: None }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpenSearchConfig {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_idle_per_host: default_max_idle_per_host(),
            keepalive_secs: default_keepalive_secs(),
            username: None,
            password: None,
        }
    }
}

impl OpenSearchConfig {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
    pub fn connect_timeout(&self) -> Duration { Duration::from_millis(self.connect_timeout_ms) }
    pub fn idle_timeout(&self) -> Duration { Duration::from_secs(self.idle_timeout_secs) }
    pub fn keepalive(&self) -> Duration { Duration::from_secs(self.keepalive_secs) }

    /// Parse a comma-separated host list, dropping blanks and trailing slashes.
    pub fn parse_hosts(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

fn default_app_name() -> String { "catalog-service".into() }
fn default_app_env() -> String { "dev".into() }
fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8080 }
fn default_log_level() -> String { "debug".into() }
fn default_log_format() -> String { "json".into() }
fn default_hosts() -> Vec<String> { vec!["http://localhost:9200".into()] }
fn default_timeout_ms() -> u64 { 15_000 }
fn default_connect_timeout_ms() -> u64 { 5_000 }
fn default_idle_timeout_secs() -> u64 { 90 }
fn default_max_idle_per_host() -> usize { 10 }
fn default_keepalive_secs() -> u64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// File (if present) + process environment, normalised and validated.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Override fields from `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("APP_NAME") { self.app.name = v; }
        if let Some(v) = get("APP_ENV") { self.app.env = v; }
        if let Some(v) = get("LOG_LEVEL") { self.logging.level = v; }
        if let Some(v) = get("LOG_FORMAT") { self.logging.format = v; }
        if let Some(v) = get("SERVER_HOST") { self.server.host = v; }
        if let Some(v) = get("SERVER_PORT").and_then(|v| v.trim().parse().ok()) { self.server.port = v; }
        if let Some(v) = get("TOKIO_WORKER_THREADS").and_then(|v| v.trim().parse().ok()) {
            self.server.worker_threads = Some(v);
        }

        let os = &mut self.opensearch;
        if let Some(v) = get("OPENSEARCH_HOST_SERVERS") { os.hosts = OpenSearchConfig::parse_hosts(&v); }
        if let Some(v) = get("OPENSEARCH_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) { os.timeout_ms = v; }
        if let Some(v) = get("OPENSEARCH_CONNECT_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            os.connect_timeout_ms = v;
        }
        if let Some(v) = get("OPENSEARCH_IDLE_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            os.idle_timeout_secs = v;
        }
        if let Some(v) = get("OPENSEARCH_MAX_IDLE_PER_HOST").and_then(|v| v.trim().parse().ok()) {
            os.max_idle_per_host = v;
        }
        if let Some(v) = get("OPENSEARCH_KEEPALIVE_SECS").and_then(|v| v.trim().parse().ok()) {
            os.keepalive_secs = v;
        }
        if let Some(v) = get("OPENSEARCH_USERNAME") { os.username = Some(v); }
        if let Some(v) = get("OPENSEARCH_PASSWORD") { os.password = Some(v); }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.app.normalize()?;
        self.server.normalize()?;
        self.logging.normalize();
        self.opensearch.normalize()?;
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl AppSection {
    fn normalize(&mut self) -> Result<()> {
        if self.name.trim().is_empty() {
            self.name = default_app_name();
        }
        self.env = self.env.trim().to_ascii_lowercase();
        if !ALLOWED_ENVS.contains(&self.env.as_str()) {
            return Err(anyhow!(
                "invalid APP_ENV '{}': must be one of {}",
                self.env,
                ALLOWED_ENVS.join(", ")
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        self.level = self.level.trim().to_ascii_lowercase();
        if self.level.is_empty() {
            self.level = default_log_level();
        }
        self.format = self.format.trim().to_ascii_lowercase();
        if self.format.is_empty() {
            self.format = default_log_format();
        }
    }
}

impl OpenSearchConfig {
    fn normalize(&mut self) -> Result<()> {
        self.hosts = self
            .hosts
            .iter()
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if self.hosts.is_empty() {
            return Err(anyhow!("opensearch.hosts is empty; set OPENSEARCH_HOST_SERVERS"));
        }
        if let Some(bad) = self.hosts.iter().find(|h| !(h.starts_with("http://") || h.starts_with("https://"))) {
            return Err(anyhow!("opensearch host '{bad}' must start with http:// or https://"));
        }
        if self.timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(anyhow!("opensearch timeouts must be positive"));
        }
        Ok(())
    }
}
