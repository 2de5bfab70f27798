// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{CmsError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub blog: BlogConfig,
    pub crm: CrmConfig,
    pub uploads: UploadConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors_allow_any: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlogConfig {
    pub content_dir: PathBuf,
    pub toc_min_level: u8,
    pub toc_max_level: u8,
    pub strip_heading_symbols: bool,
    pub dedupe_heading_ids: bool,
    pub enable_math: bool,
    pub hard_breaks: bool,
    pub list_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrmConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub location_id: Option<String>,
    pub api_version: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub public_prefix: String,
    pub max_size_mb: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminConfig {
    pub token: Option<String>,
}

/// Bounds on the in-memory attribution sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 7 * 24 * 60 * 60,
            max_sessions: 50_000,
        }
    }
}

const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
const ENV_PREFIX: &str = "BLOG_CMS";

impl Config {
    /// Built-in defaults, then the TOML file, then `BLOG_CMS__*` environment
    /// variables (after loading `.env`).
    ///
    /// An explicit `path` must exist. Without one, `config/default.toml` is
    /// read when present and skipped otherwise; the environment still applies.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path),
            None => config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        Self::layered(file, None)
    }

    fn layered<F>(file: F, env: Option<config::Map<String, String>>) -> Result<Self>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| CmsError::Config(e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(|e| CmsError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| CmsError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                cors_allow_any: false,
            },
            blog: BlogConfig {
                content_dir: PathBuf::from("data/blogs"),
                toc_min_level: 2,
                toc_max_level: 3,
                strip_heading_symbols: true,
                dedupe_heading_ids: true,
                enable_math: true,
                hard_breaks: true,
                list_concurrency: 8,
            },
            crm: CrmConfig {
                endpoint: "https://services.leadconnectorhq.com/contacts/".to_string(),
                api_token: None,
                location_id: None,
                api_version: "2021-07-28".to_string(),
                timeout_secs: Some(15),
            },
            uploads: UploadConfig {
                dir: PathBuf::from("public/uploads"),
                public_prefix: "/uploads".to_string(),
                max_size_mb: 5,
            },
            admin: AdminConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        Validator::validate_port(self.server.port).map_err(into_config)?;
        Validator::validate_url(&self.crm.endpoint).map_err(into_config)?;

        let (min, max) = (self.blog.toc_min_level, self.blog.toc_max_level);
        if !(1..=6).contains(&min) || !(1..=6).contains(&max) || min > max {
            return Err(CmsError::Config(format!(
                "toc levels must satisfy 1 <= min <= max <= 6 (got {}..={})",
                min, max
            )));
        }

        if self.blog.list_concurrency == 0 {
            return Err(CmsError::Config(
                "list_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.tracking.session_ttl_secs == 0 || self.tracking.max_sessions == 0 {
            return Err(CmsError::Config(
                "tracking session_ttl_secs and max_sessions must be greater than 0".to_string(),
            ));
        }

        if self.uploads.max_size_mb == 0 {
            return Err(CmsError::Config(
                "max_size_mb must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn into_config(err: CmsError) -> CmsError {
    match err {
        CmsError::Validation { message, .. } => CmsError::Config(message),
        other => other,
    }
}
