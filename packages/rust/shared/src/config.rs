//! Application configuration for jobwatch.
//!
//! User config lives at `~/.jobwatch/jobwatch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{JobwatchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "jobwatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".jobwatch";

// ---------------------------------------------------------------------------
// Config structs (matching jobwatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target site layout.
    #[serde(default)]
    pub site: SiteSection,

    /// Salary notation conventions.
    #[serde(default)]
    pub salary: SalaryRules,

    /// HTTP fetch limits.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Database location.
    #[serde(default)]
    pub storage: StorageSection,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Site origin; relative posting links are appended to it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path of the listing index page.
    #[serde(default = "default_listing_path")]
    pub listing_path: String,

    /// Description-list label that precedes the salary value.
    #[serde(default = "default_salary_label")]
    pub salary_label: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            listing_path: default_listing_path(),
            salary_label: default_salary_label(),
        }
    }
}

fn default_origin() -> String {
    "https://slo-tech.com".into()
}
fn default_listing_path() -> String {
    "/delo".into()
}
fn default_salary_label() -> String {
    "Plačilo:".into()
}

/// `[salary]` section: the notation conventions the normalizer understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRules {
    /// Working hours in a month, for hourly rates.
    #[serde(default = "default_hours_per_month")]
    pub hours_per_month: f64,

    /// Results above this are assumed to carry a stray two-digit fraction.
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,

    /// Divisor applied to results above `ceiling`.
    #[serde(default = "default_ceiling_divisor")]
    pub ceiling_divisor: f64,

    /// Textual range marker ("1000 do 2000").
    #[serde(default = "default_range_word")]
    pub range_word: String,

    /// Per-hour marker word ("15 eur/uro").
    #[serde(default = "default_hourly_marker")]
    pub hourly_marker: String,

    /// Thousands-gross phrase ("20-25 k bruto").
    #[serde(default = "default_thousands_marker")]
    pub thousands_marker: String,

    /// Marks a one-time engagement with no recurring yearly pay.
    #[serde(default = "default_project_marker")]
    pub project_marker: String,
}

impl Default for SalaryRules {
    fn default() -> Self {
        Self {
            hours_per_month: default_hours_per_month(),
            ceiling: default_ceiling(),
            ceiling_divisor: default_ceiling_divisor(),
            range_word: default_range_word(),
            hourly_marker: default_hourly_marker(),
            thousands_marker: default_thousands_marker(),
            project_marker: default_project_marker(),
        }
    }
}

fn default_hours_per_month() -> f64 {
    168.0
}
fn default_ceiling() -> f64 {
    100_000.0
}
fn default_ceiling_divisor() -> f64 {
    100.0
}
fn default_range_word() -> String {
    "do".into()
}
fn default_hourly_marker() -> String {
    "uro".into()
}
fn default_thousands_marker() -> String {
    "k bruto".into()
}
fn default_project_marker() -> String {
    "projekt".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Client-level timeout for any request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on a single detail-page fetch, in seconds.
    #[serde(default = "default_detail_timeout_secs")]
    pub detail_timeout_secs: u64,

    /// Maximum detail pages in flight at once.
    #[serde(default = "default_max_concurrent_details")]
    pub max_concurrent_details: u32,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            detail_timeout_secs: default_detail_timeout_secs(),
            max_concurrent_details: default_max_concurrent_details(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_detail_timeout_secs() -> u64 {
    15
}
fn default_max_concurrent_details() -> u32 {
    8
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Path to the libSQL database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "var/jobwatch.db".into()
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Background refresh period in seconds; 0 disables it.
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            refresh_interval_secs: 0,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}

// ---------------------------------------------------------------------------
// Runtime config (validated, immutable)
// ---------------------------------------------------------------------------

/// Runtime site configuration handed to the listing extractor.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Origin without a trailing slash, e.g. `https://slo-tech.com`.
    pub origin: String,
    /// Absolute URL of the listing index page.
    pub listing_url: String,
    /// Salary label marker.
    pub salary_label: String,
}

impl SiteConfig {
    /// Build and validate from the `[site]` section.
    pub fn from_section(section: &SiteSection) -> Result<Self> {
        let origin = section.origin.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&origin)
            .map_err(|e| JobwatchError::config(format!("invalid site origin '{origin}': {e}")))?;
        if parsed.host_str().is_none() {
            return Err(JobwatchError::config(format!(
                "site origin '{origin}' has no host"
            )));
        }
        if section.salary_label.trim().is_empty() {
            return Err(JobwatchError::config("site.salary_label must not be empty"));
        }

        let path = section.listing_path.trim();
        let listing_url = if path.starts_with('/') {
            format!("{origin}{path}")
        } else {
            format!("{origin}/{path}")
        };

        Ok(Self {
            origin,
            listing_url,
            salary_label: section.salary_label.clone(),
        })
    }
}

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Client-level request timeout.
    pub timeout: Duration,
    /// Per detail-page timeout during enrichment.
    pub detail_timeout: Duration,
    /// Maximum detail pages in flight.
    pub max_concurrent_details: usize,
}

impl From<&FetchSection> for FetchConfig {
    fn from(section: &FetchSection) -> Self {
        Self {
            timeout: Duration::from_secs(section.timeout_secs.max(1)),
            detail_timeout: Duration::from_secs(section.detail_timeout_secs.max(1)),
            max_concurrent_details: section.max_concurrent_details.max(1) as usize,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&FetchSection::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.jobwatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| JobwatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.jobwatch/jobwatch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| JobwatchError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| JobwatchError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| JobwatchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| JobwatchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| JobwatchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("origin = \"https://slo-tech.com\""));
        assert!(toml_str.contains("hours_per_month = 168.0"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.salary, SalaryRules::default());
        assert_eq!(parsed.site.salary_label, "Plačilo:");
        assert_eq!(parsed.server.refresh_interval_secs, 0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[site]
origin = "http://localhost:8080/"

[salary]
hours_per_month = 160.0
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.salary.hours_per_month, 160.0);
        assert_eq!(config.salary.ceiling, 100_000.0);
        assert_eq!(config.site.listing_path, "/delo");
        assert_eq!(config.fetch.max_concurrent_details, 8);
    }

    #[test]
    fn site_config_builds_listing_url() {
        let section = SiteSection {
            origin: "https://slo-tech.com/".into(),
            listing_path: "delo".into(),
            ..SiteSection::default()
        };
        let site = SiteConfig::from_section(&section).expect("valid site");
        assert_eq!(site.origin, "https://slo-tech.com");
        assert_eq!(site.listing_url, "https://slo-tech.com/delo");
    }

    #[test]
    fn site_config_rejects_bad_origin() {
        let section = SiteSection {
            origin: "not a url".into(),
            ..SiteSection::default()
        };
        let err = SiteConfig::from_section(&section).unwrap_err();
        assert!(err.to_string().contains("invalid site origin"));
    }

    #[test]
    fn fetch_config_clamps_zero_values() {
        let section = FetchSection {
            timeout_secs: 0,
            detail_timeout_secs: 0,
            max_concurrent_details: 0,
        };
        let fetch = FetchConfig::from(&section);
        assert_eq!(fetch.timeout, Duration::from_secs(1));
        assert_eq!(fetch.max_concurrent_details, 1);
    }
}
