use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Where the session (token, user, logged-out guard) is persisted.
/// Without a path the session lives in process memory only.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_timeout() -> u64 { 15 }
fn default_connect_timeout() -> u64 { 5 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file is absent, then apply `.env`/environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.api.normalize_from_env();
        self.api.validate()?;
        self.storage.normalize_from_env();
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ApiConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("API_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Some(secs) = std::env::var("API_TIMEOUT_SECS").ok().and_then(|v| v.parse::<u64>().ok()) {
            self.timeout_secs = secs;
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow!("api.base_url is empty; set it in config.toml or API_BASE_URL"));
        }
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.base_url must start with http:// or https://"));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(anyhow!("api timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(path) = std::env::var("SESSION_STORAGE_PATH") {
            if !path.trim().is_empty() {
                self.path = Some(path);
            }
        }
        if matches!(self.path.as_deref(), Some(p) if p.trim().is_empty()) {
            self.path = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = parse(
            r#"
            [api]
            base_url = "https://api.example.com/"
            timeout_secs = 20

            [storage]
            path = "data/session.json"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.timeout_secs, 20);
        assert_eq!(cfg.api.connect_timeout_secs, 5);
        assert_eq!(cfg.storage.path.as_deref(), Some("data/session.json"));
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn defaults_use_fifteen_second_timeout() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api.timeout(), Duration::from_secs(15));
        assert!(cfg.storage.path.is_none());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let api = ApiConfig { base_url: "ftp://x".into(), ..ApiConfig::default() };
        assert!(api.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let api = ApiConfig { timeout_secs: 0, ..ApiConfig::default() };
        assert!(api.validate().is_err());
    }

    #[test]
    fn missing_file_reports_not_found() {
        let path = std::env::temp_dir().join(format!("missing_{}.toml", uuid::Uuid::new_v4()));
        let err = load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(is_not_found(&err));
    }
}
