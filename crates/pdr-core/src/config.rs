use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::asset::AssetFormat;
use crate::retry::RetryPolicy;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    concat!("pdr/", env!("CARGO_PKG_VERSION"), " (landing page resolver)");

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("format weights must strictly decrease xlsx > csv > xls > zip > other (got {0:?})")]
    WeightsNotDecreasing([i64; 5]),
    #[error(
        "recency_bonus ({bonus}) + legacy_penalty ({penalty}) must be below the smallest gap between format weights ({gap})"
    )]
    SignalsCrossFormats { bonus: i64, penalty: i64, gap: i64 },
    #[error("recency_bonus and legacy_penalty must not be negative")]
    NegativeSignal,
}

/// HTTP client settings shared by the page fetcher and the probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Overrides the default identifying `User-Agent`.
    pub user_agent: Option<String>,
    pub connect_timeout_secs: u64,
    /// Total timeout for one landing-page request.
    pub timeout_secs: u64,
    /// Total timeout for one validation probe.
    pub probe_timeout_secs: u64,
    /// Landing pages larger than this are rejected.
    pub max_page_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout_secs: 15,
            timeout_secs: 30,
            probe_timeout_secs: 20,
            max_page_bytes: 16 * 1024 * 1024,
        }
    }
}

impl HttpConfig {
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Retry policy parameters for landing-page fetches (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per page (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 1.0 = 1s, 2s, 4s...).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Ranking weights. Format precedence is load-bearing, so `validate` rejects
/// any combination where recency or legacy signals could reorder two formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub xlsx_weight: i64,
    pub csv_weight: i64,
    pub xls_weight: i64,
    pub zip_weight: i64,
    pub other_weight: i64,
    /// Added when the URL or title carries the newest year seen on the page.
    pub recency_bonus: i64,
    /// Subtracted for archive/old/superseded URLs.
    pub legacy_penalty: i64,
    /// Extra extensions recognized as data files; they rank as `other`.
    pub extra_extensions: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            xlsx_weight: 100,
            csv_weight: 80,
            xls_weight: 60,
            zip_weight: 40,
            other_weight: 10,
            recency_bonus: 10,
            legacy_penalty: 8,
            extra_extensions: Vec::new(),
        }
    }
}

impl RankingConfig {
    pub fn weight_for(&self, format: AssetFormat) -> i64 {
        match format {
            AssetFormat::Xlsx => self.xlsx_weight,
            AssetFormat::Csv => self.csv_weight,
            AssetFormat::Xls => self.xls_weight,
            AssetFormat::Zip => self.zip_weight,
            AssetFormat::Other => self.other_weight,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = AssetFormat::ALL.map(|f| self.weight_for(f));
        if weights.windows(2).any(|w| w[0] <= w[1]) {
            return Err(ConfigError::WeightsNotDecreasing(weights));
        }
        if self.recency_bonus < 0 || self.legacy_penalty < 0 {
            return Err(ConfigError::NegativeSignal);
        }
        // Gaps wider than i64 saturate; an overflowing signal sum always crosses.
        let gap = weights
            .windows(2)
            .map(|w| w[0].checked_sub(w[1]).unwrap_or(i64::MAX))
            .min()
            .unwrap_or(i64::MAX);
        let crossing = self
            .recency_bonus
            .checked_add(self.legacy_penalty)
            .map_or(true, |sum| sum >= gap);
        if crossing {
            return Err(ConfigError::SignalsCrossFormats {
                bonus: self.recency_bonus,
                penalty: self.legacy_penalty,
                gap,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Probes in flight at once for one landing page.
    pub max_concurrent: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Global configuration loaded from `~/.config/pdr/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdrConfig {
    /// Overrides the resolution cache location (default under the XDG cache dir).
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default)]
    pub http: HttpConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl PdrConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ranking.validate()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pdr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PdrConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PdrConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<PdrConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PdrConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
