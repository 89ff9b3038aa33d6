pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::comparison::ComparisonRequest;
use crate::core::config::AppConfig;
use crate::core::price::{DateRange, PriceHistory};
use crate::core::savings::AccrualGranularity;
use crate::core::strategy::find_strategy;
use crate::providers::{YahooCurrencyProvider, YahooFinanceProvider};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info};

/// Command line overrides for a comparison run. `None` keeps the configured
/// value.
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub strategy: Option<String>,
    /// Annual savings rate in percent.
    pub annual_rate: Option<f64>,
    pub contribution: Option<f64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub compounding: Option<u32>,
    pub granularity: Option<AccrualGranularity>,
    pub json: bool,
}

impl CompareOptions {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(strategy) = &self.strategy {
            config.default_strategy = strategy.clone();
        }
        if let Some(rate) = self.annual_rate {
            config.annual_rate = rate;
        }
        if let Some(amount) = self.contribution {
            config.contribution = amount;
        }
        if let Some(start) = self.start {
            config.start_date = start;
        }
        if self.end.is_some() {
            config.end_date = self.end;
        }
        if let Some(compounding) = self.compounding {
            config.compounding_periods_per_year = compounding;
        }
        if let Some(granularity) = self.granularity {
            config.accrual_granularity = granularity;
        }
        config
    }
}

pub enum AppCommand {
    Compare(CompareOptions),
    Strategies,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn build_request(config: &AppConfig) -> Result<ComparisonRequest> {
    if !(config.annual_rate.is_finite() && config.annual_rate >= 0.0) {
        anyhow::bail!(
            "Annual rate must be a non-negative percentage, got {}",
            config.annual_rate
        );
    }
    let strategy = find_strategy(&config.strategies, &config.default_strategy)
        .with_context(|| {
            format!(
                "Unknown strategy: {}. Run `dcx strategies` to list the configured ones",
                config.default_strategy
            )
        })?
        .clone();
    let end = config
        .end_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    Ok(ComparisonRequest {
        strategy,
        range: DateRange::new(config.start_date, end)?,
        contribution: config.contribution,
        home_currency: config.home_currency.clone(),
        savings: config.savings_config(),
    })
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        AppCommand::Strategies => {
            cli::strategies::run(&config.strategies, &config.default_strategy);
            Ok(())
        }
        AppCommand::Compare(options) => {
            let config = options.apply(config);
            let request = build_request(&config)?;
            info!(
                "Comparing strategy {} over {}",
                request.strategy.key, request.range
            );

            let ttl = Duration::from_secs(config.cache.ttl_hours.saturating_mul(3600));
            let base_url = config.providers.yahoo_base_url();
            let price_provider = YahooFinanceProvider::new(
                base_url,
                store::open_cache::<String, PriceHistory>(&config, "prices"),
            )
            .with_ttl(ttl);
            let rate_provider = YahooCurrencyProvider::new(
                base_url,
                store::open_cache::<String, PriceHistory>(&config, "rates"),
            )
            .with_ttl(ttl);

            cli::compare::run(&request, &price_provider, &rate_provider, options.json).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_override_config() {
        let options = CompareOptions {
            strategy: Some("tsx".to_string()),
            annual_rate: Some(4.5),
            contribution: Some(250.0),
            end: NaiveDate::from_ymd_opt(2022, 12, 31),
            ..Default::default()
        };

        let config = options.apply(AppConfig::default());

        assert_eq!(config.default_strategy, "tsx");
        assert_eq!(config.annual_rate, 4.5);
        assert_eq!(config.contribution, 250.0);
        assert_eq!(config.compounding_periods_per_year, 12);
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2022, 12, 31));
    }

    #[test]
    fn test_compounding_applies_with_compounding_granularity() {
        let request = |granularity| {
            let config = CompareOptions {
                compounding: Some(365),
                granularity,
                end: NaiveDate::from_ymd_opt(2021, 6, 1),
                ..Default::default()
            }
            .apply(AppConfig::default());
            build_request(&config).unwrap()
        };

        let default = request(None);
        assert_eq!(default.savings.compounding_periods_per_year, 365);
        assert_eq!(
            default.savings.granularity,
            AccrualGranularity::ContributionPeriod
        );

        let daily = request(Some(AccrualGranularity::CompoundingPeriod));
        assert_eq!(
            daily.savings.granularity,
            AccrualGranularity::CompoundingPeriod
        );
    }

    #[test]
    fn test_build_request_rejects_unknown_strategy() {
        let config = CompareOptions {
            strategy: Some("bitcoin".to_string()),
            ..Default::default()
        }
        .apply(AppConfig::default());

        let err = build_request(&config).unwrap_err();
        assert!(err.to_string().starts_with("Unknown strategy: bitcoin"));
    }

    #[test]
    fn test_build_request_uses_percent_rate() {
        let config = CompareOptions {
            annual_rate: Some(5.0),
            end: NaiveDate::from_ymd_opt(2021, 6, 1),
            ..Default::default()
        }
        .apply(AppConfig::default());

        let request = build_request(&config).unwrap();
        assert_eq!(request.strategy.key, "sp500");
        assert!((request.savings.annual_rate - 0.05).abs() < 1e-12);
        assert_eq!(request.home_currency, "CAD");
    }

    #[test]
    fn test_build_request_rejects_negative_rate() {
        let config = CompareOptions {
            annual_rate: Some(-1.0),
            ..Default::default()
        }
        .apply(AppConfig::default());

        let err = build_request(&config).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_build_request_rejects_inverted_range() {
        let config = CompareOptions {
            start: NaiveDate::from_ymd_opt(2022, 1, 1),
            end: NaiveDate::from_ymd_opt(2021, 1, 1),
            ..Default::default()
        }
        .apply(AppConfig::default());

        assert!(build_request(&config).is_err());
    }
}
