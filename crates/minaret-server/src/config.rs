use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use minaret_dispatch::SchedulerSettings;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fcm: FcmConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Transport validations
        if self.fcm.endpoint.is_empty() {
            return Err("fcm.endpoint must not be empty".into());
        }
        if self.fcm.timeout_ms == 0 {
            return Err("fcm.timeout_ms must be > 0".into());
        }
        // Scheduler validations
        if self.scheduler.poll_interval_secs == 0 {
            return Err("scheduler.poll_interval_secs must be > 0".into());
        }
        if self.scheduler.page_size == 0 {
            return Err("scheduler.page_size must be > 0".into());
        }
        if self.scheduler.due_window_secs == 0 {
            return Err("scheduler.due_window_secs must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            poll_interval: Duration::from_secs(self.scheduler.poll_interval_secs),
            page_size: self.scheduler.page_size,
            due_window: time::Duration::seconds(self.scheduler.due_window_secs as i64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Push transport endpoint and credential.
///
/// The credential is a ready-to-use bearer token; provisioning it (service
/// accounts, token refresh) happens outside this process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    #[serde(default = "default_fcm_endpoint")]
    pub endpoint: String,
    /// Prefer the MINARET__FCM__AUTH_TOKEN env var over the file for this.
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_fcm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_fcm_endpoint() -> String {
    "https://fcm.googleapis.com/v1/projects/minaret/messages:send".into()
}
fn default_fcm_timeout_ms() -> u64 {
    10_000
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_fcm_endpoint(),
            auth_token: String::new(),
            timeout_ms: default_fcm_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_due_window_secs")]
    pub due_window_secs: u64,
}

fn default_scheduler_enabled() -> bool {
    true
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_page_size() -> usize {
    100
}
fn default_due_window_secs() -> u64 {
    120
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            poll_interval_secs: default_poll_interval_secs(),
            page_size: default_page_size(),
            due_window_secs: default_due_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("minaret.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., MINARET__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("MINARET")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
