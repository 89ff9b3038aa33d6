use crate::core::savings::{AccrualGranularity, ContributionTiming, SavingsConfig};
use crate::core::strategy::{Strategy, default_strategies};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

fn default_home_currency() -> String {
    "CAD".to_string()
}

fn default_contribution() -> f64 {
    1000.0
}

fn default_annual_rate() -> f64 {
    2.0
}

fn default_compounding() -> u32 {
    12
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default()
}

fn default_strategy_key() -> String {
    "sp500".to_string()
}

fn default_ttl_hours() -> u64 {
    12
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: DEFAULT_YAHOO_URL.to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo
            .as_ref()
            .map_or(DEFAULT_YAHOO_URL, |p| p.base_url.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Keep downloaded histories on disk between runs.
    #[serde(default)]
    pub persist: bool,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            persist: false,
            ttl_hours: default_ttl_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
    /// Amount contributed every month.
    #[serde(default = "default_contribution")]
    pub contribution: f64,
    /// Savings account annual rate in percent.
    #[serde(default = "default_annual_rate")]
    pub annual_rate: f64,
    #[serde(default = "default_compounding")]
    pub compounding_periods_per_year: u32,
    #[serde(default)]
    pub contribution_timing: ContributionTiming,
    #[serde(default)]
    pub accrual_granularity: AccrualGranularity,
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Defaults to today.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_strategy_key")]
    pub default_strategy: String,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home_currency: default_home_currency(),
            contribution: default_contribution(),
            annual_rate: default_annual_rate(),
            compounding_periods_per_year: default_compounding(),
            contribution_timing: ContributionTiming::default(),
            accrual_granularity: AccrualGranularity::default(),
            start_date: default_start_date(),
            end_date: None,
            default_strategy: default_strategy_key(),
            strategies: default_strategies(),
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or falls back to built-in
    /// defaults when no file has been set up yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "dcx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "dcx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn savings_config(&self) -> SavingsConfig {
        SavingsConfig {
            annual_rate: self.annual_rate / 100.0,
            compounding_periods_per_year: self.compounding_periods_per_year,
            timing: self.contribution_timing,
            granularity: self.accrual_granularity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.home_currency, "CAD");
        assert_eq!(config.contribution, 1000.0);
        assert_eq!(config.annual_rate, 2.0);
        assert_eq!(config.compounding_periods_per_year, 12);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert!(config.end_date.is_none());
        assert_eq!(config.default_strategy, "sp500");
        assert_eq!(config.strategies.len(), 5);
        assert_eq!(
            config.providers.yahoo_base_url(),
            "https://query1.finance.yahoo.com"
        );
        assert!(!config.cache.persist);
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
home_currency: "EUR"
contribution: 500
annual_rate: 3.5
compounding_periods_per_year: 365
contribution_timing: before_accrual
accrual_granularity: compounding_period
start_date: "2020-06-01"
end_date: "2023-06-01"
default_strategy: "world"
strategies:
  - key: "world"
    name: "All World"
    components:
      - symbol: "VWCE.DE"
        currency: "EUR"
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
cache:
  persist: true
data_path: "/tmp/dcx"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.home_currency, "EUR");
        assert_eq!(config.contribution, 500.0);
        assert_eq!(
            config.end_date,
            Some(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap())
        );
        assert_eq!(config.strategies.len(), 1);
        assert_eq!(config.strategies[0].components[0].weight, 1.0);
        assert_eq!(config.providers.yahoo_base_url(), "http://example.com/yahoo");
        assert!(config.cache.persist);
        assert_eq!(config.cache.ttl_hours, 12);
        assert_eq!(config.data_path().unwrap(), PathBuf::from("/tmp/dcx"));

        let savings = config.savings_config();
        assert!((savings.annual_rate - 0.035).abs() < 1e-12);
        assert_eq!(savings.compounding_periods_per_year, 365);
        assert_eq!(savings.timing, ContributionTiming::BeforeAccrual);
        assert_eq!(savings.granularity, AccrualGranularity::CompoundingPeriod);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/definitely/not/here/config.yaml");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
