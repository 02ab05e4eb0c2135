use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::AggregateOptions;
use crate::credential::DEFAULT_API_KEY_ENV;
use crate::driver::Politeness;
use crate::error::ConfigError;
use crate::fetcher::FetchSettings;
use crate::retry::RetryPolicy;

pub const DEFAULT_API_BASE: &str =
    "https://opendata.aemet.es/opendata/api/valores/climatologicos/diarios/datos";

/// Upper bound for every configured delay and jitter, in seconds (one day).
pub const MAX_CONFIG_DELAY_SECS: u64 = 86_400;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per stage (including the first).
    pub max_attempts: u32,
    /// Linear backoff step in seconds; attempt n waits n times this.
    pub base_delay_secs: f64,
    /// Upper bound of the random jitter added to each backoff, in seconds.
    pub jitter_secs: f64,
    /// Backoff step for 429 responses without `Retry-After`.
    pub rate_limit_base_secs: f64,
    /// Ceiling for computed delays, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_attempts: p.max_attempts,
            base_delay_secs: p.base_delay.as_secs_f64(),
            jitter_secs: p.jitter.as_secs_f64(),
            rate_limit_base_secs: p.rate_limit_base.as_secs_f64(),
            max_delay_secs: p.max_delay.as_secs(),
        }
    }
}

/// How raw records are read when building the canonical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub date_field: String,
    pub entity_field: String,
    /// Fields coerced to numbers; everything else passes through as text.
    pub numeric_fields: Vec<String>,
    /// Token meaning "negligible", read as 0.0 (AEMET uses `Ip` for trace precipitation).
    pub negligible_token: String,
    /// Token meaning "multiple/unspecified", read as missing.
    pub unspecified_token: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            date_field: "fecha".into(),
            entity_field: "indicativo".into(),
            numeric_fields: [
                "altitud", "tmed", "tmin", "tmax", "prec", "sol", "velmedia", "racha", "dir",
                "presMax", "presMin", "hrMedia", "hrMax", "hrMin",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            negligible_token: "Ip".into(),
            unspecified_token: "Varias".into(),
        }
    }
}

/// Global configuration loaded from `~/.config/aemet-sync/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AemetConfig {
    /// Index endpoint; requests append `/fechaini/.../estacion/<id>`.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Default chunk size in calendar months.
    pub chunk_months: u32,
    /// Pause after every chunk that needed the network.
    pub politeness_delay_secs: f64,
    /// Upper bound of the random jitter added to the pause.
    pub politeness_jitter_secs: f64,
    pub user_agent: String,
    /// Connection phase limit; the per-stage timeouts still bound the whole request.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    pub index_timeout_secs: u64,
    pub data_timeout_secs: u64,
    /// Where progress, snapshots and locks live (default: XDG state dir).
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Where CSV artifacts are written (default: current directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub aggregate: AggregateConfig,
}

impl Default for AemetConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            chunk_months: 3,
            politeness_delay_secs: 1.5,
            politeness_jitter_secs: 0.7,
            user_agent: format!("aemet-sync/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: default_connect_timeout_secs(),
            index_timeout_secs: 60,
            data_timeout_secs: 180,
            state_dir: None,
            output_dir: None,
            retry: None,
            aggregate: AggregateConfig::default(),
        }
    }
}

impl AemetConfig {
    /// Reject values that would make every run fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_months == 0 {
            return Err(ConfigError::InvalidChunkSize(0));
        }
        if matches!(&self.retry, Some(r) if r.max_attempts == 0) {
            return Err(ConfigError::ZeroAttempts);
        }
        check_delay("politeness_delay_secs", self.politeness_delay_secs)?;
        check_delay("politeness_jitter_secs", self.politeness_jitter_secs)?;
        if let Some(r) = &self.retry {
            check_delay("retry.base_delay_secs", r.base_delay_secs)?;
            check_delay("retry.jitter_secs", r.jitter_secs)?;
            check_delay("retry.rate_limit_base_secs", r.rate_limit_base_secs)?;
            if r.max_delay_secs > MAX_CONFIG_DELAY_SECS {
                return Err(ConfigError::InvalidDelay {
                    field: "retry.max_delay_secs",
                    value: r.max_delay_secs.to_string(),
                    max: MAX_CONFIG_DELAY_SECS,
                });
            }
        }
        match url::Url::parse(&self.api_base) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
            Ok(u) => Err(ConfigError::InvalidApiBase {
                url: self.api_base.clone(),
                reason: format!("unsupported scheme {}", u.scheme()),
            }),
            Err(e) => Err(ConfigError::InvalidApiBase {
                url: self.api_base.clone(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let r = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: r.max_attempts,
            base_delay: secs(r.base_delay_secs),
            jitter: secs(r.jitter_secs),
            rate_limit_base: secs(r.rate_limit_base_secs),
            max_delay: Duration::from_secs(r.max_delay_secs),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            api_base: self.api_base.clone(),
            index_timeout: Duration::from_secs(self.index_timeout_secs),
            data_timeout: Duration::from_secs(self.data_timeout_secs),
        }
    }

    pub fn politeness(&self) -> Politeness {
        Politeness {
            delay: secs(self.politeness_delay_secs),
            jitter: secs(self.politeness_jitter_secs),
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions::from(&self.aggregate)
    }

    /// `output_dir` from the config, else the current directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn check_delay(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=MAX_CONFIG_DELAY_SECS as f64).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDelay {
            field,
            value: value.to_string(),
            max: MAX_CONFIG_DELAY_SECS,
        })
    }
}

/// Callers validate first; anything unrepresentable reads as zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("aemet-sync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AemetConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<AemetConfig> {
    if !path.exists() {
        let default_cfg = AemetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AemetConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
