//! Builds the savings-versus-strategy comparison.
//!
//! [`compare`] is the pure part: aligned home-currency instruments in, report
//! out. [`run_comparison`] fetches and aligns the market data first.
use crate::core::currency::{self, CurrencyRateProvider, ExchangeRateSeries};
use crate::core::dca::{self, Instrument};
use crate::core::error::{Result as SimulationResult, SimulationError};
use crate::core::price::{DateRange, PriceHistory, PriceProvider};
use crate::core::savings::{self, SavingsConfig};
use crate::core::schedule::ContributionSchedule;
use crate::core::series::{Currency, PriceSeries, monthly_calendar};
use crate::core::strategy::Strategy;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingSeries {
    pub symbol: String,
    pub weight: f64,
    pub prices: Vec<f64>,
    pub units: Vec<f64>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub strategy: String,
    pub dates: Vec<NaiveDate>,
    /// Running total of contributions, which is also the balance of a
    /// zero-interest checking account.
    pub contributed: Vec<f64>,
    pub savings: Vec<f64>,
    pub strategy_value: Vec<f64>,
    pub holdings: Vec<HoldingSeries>,
    /// Strategy value minus savings balance in the last period.
    pub terminal_gap: f64,
}

impl ComparisonReport {
    pub fn periods(&self) -> usize {
        self.dates.len()
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub strategy: Strategy,
    pub range: DateRange,
    pub contribution: f64,
    pub home_currency: String,
    pub savings: SavingsConfig,
}

/// Simulates the strategy and the savings account over the instruments'
/// shared calendar. At least one period is required.
pub fn compare(
    strategy: &str,
    instruments: &[Instrument],
    schedule: &ContributionSchedule,
    savings_config: &SavingsConfig,
) -> SimulationResult<ComparisonReport> {
    if schedule.periods() == 0 {
        return Err(SimulationError::EmptyRange);
    }

    let composite = dca::simulate_composite(instruments, schedule)?;
    let savings = savings::simulate(schedule, savings_config)?;
    let contributed = savings::checking_balance(schedule);
    let dates = instruments
        .first()
        .map(|i| i.prices.dates().collect())
        .unwrap_or_default();

    let terminal_gap = match (composite.values.last(), savings.last()) {
        (Some(strategy_value), Some(balance)) => strategy_value - balance,
        _ => return Err(SimulationError::EmptyRange),
    };

    let holdings = composite
        .instruments
        .into_iter()
        .map(|held| HoldingSeries {
            prices: held.outcome.positions.iter().map(|p| p.price).collect(),
            units: held.outcome.units(),
            values: held.outcome.values(),
            symbol: held.id,
            weight: held.weight,
        })
        .collect();

    Ok(ComparisonReport {
        strategy: strategy.to_string(),
        dates,
        contributed,
        savings,
        strategy_value: composite.values,
        holdings,
        terminal_gap,
    })
}

/// Fetches every series the strategy needs, converts it to the home currency
/// on a month-start calendar and runs [`compare`].
///
/// `on_fetch` is called once per completed download.
pub async fn run_comparison(
    request: &ComparisonRequest,
    price_provider: &(dyn PriceProvider + Send + Sync),
    rate_provider: &(dyn CurrencyRateProvider + Send + Sync),
    on_fetch: &(dyn Fn() + Sync),
) -> Result<ComparisonReport> {
    let calendar = monthly_calendar(request.range.start, request.range.end);
    if calendar.is_empty() {
        return Err(SimulationError::EmptyRange)
            .with_context(|| format!("No month starts within {}", request.range));
    }
    info!(
        "Comparing {} against savings over {} months",
        request.strategy.name,
        calendar.len()
    );

    let history_futures = request.strategy.components.iter().map(|component| async move {
        let history = price_provider
            .fetch_history(&component.symbol, &request.range)
            .await
            .with_context(|| format!("Failed to fetch price history for {}", component.symbol));
        on_fetch();
        history
    });
    let histories = join_all(history_futures)
        .await
        .into_iter()
        .collect::<Result<Vec<PriceHistory>>>()?;

    let quote_currencies = request
        .strategy
        .components
        .iter()
        .zip(&histories)
        .map(|(component, history)| {
            let currency = component
                .currency
                .as_deref()
                .unwrap_or(history.currency.as_str())
                .trim()
                .to_uppercase();
            if currency.is_empty() {
                bail!(
                    "No quote currency for {}; set `currency` in the strategy",
                    component.symbol
                );
            }
            Ok(currency)
        })
        .collect::<Result<Vec<String>>>()?;
    let home = request.home_currency.to_uppercase();

    let foreign: BTreeSet<&String> = quote_currencies.iter().filter(|c| **c != home).collect();
    let rate_futures = foreign.iter().map(|currency| {
        let home = &home;
        async move {
            let history = rate_provider
                .fetch_rate_history(home, currency, &request.range)
                .await
                .with_context(|| format!("Failed to fetch {home}/{currency} exchange rates"));
            on_fetch();
            history.map(|h| ((*currency).clone(), h))
        }
    });
    let rate_histories = join_all(rate_futures)
        .await
        .into_iter()
        .collect::<Result<Vec<(String, PriceHistory)>>>()?;

    let mut rates = Vec::with_capacity(rate_histories.len());
    for (currency, history) in &rate_histories {
        let aligned = history
            .to_series(Currency::Home)
            .and_then(|s| s.reindex_forward_fill(&calendar))
            .with_context(|| format!("Failed to align {} exchange rates", history.symbol))?;
        rates.push((
            currency.as_str(),
            ExchangeRateSeries::new(&history.symbol, aligned),
        ));
    }

    let mut instruments = Vec::with_capacity(histories.len());
    for ((component, history), quote_currency) in request
        .strategy
        .components
        .iter()
        .zip(&histories)
        .zip(&quote_currencies)
    {
        let prices = to_home_series(history, quote_currency, &home, &rates, &calendar)
            .with_context(|| format!("Failed to prepare prices for {}", component.symbol))?;
        instruments.push(Instrument::new(
            component.symbol.clone(),
            prices,
            component.weight,
        )?);
    }

    let schedule = ContributionSchedule::monthly(request.contribution, calendar.len())?;
    let report = compare(
        &request.strategy.name,
        &instruments,
        &schedule,
        &request.savings,
    )?;
    debug!(
        "Terminal gap for {}: {:.2}",
        report.strategy, report.terminal_gap
    );
    Ok(report)
}

fn to_home_series(
    history: &PriceHistory,
    quote_currency: &str,
    home: &str,
    rates: &[(&str, ExchangeRateSeries)],
    calendar: &[NaiveDate],
) -> Result<PriceSeries> {
    if quote_currency == home {
        return Ok(history
            .to_series(Currency::Home)?
            .reindex_forward_fill(calendar)?);
    }

    let rate = rates
        .iter()
        .find(|(currency, _)| *currency == quote_currency)
        .map(|(_, rate)| rate)
        .with_context(|| format!("No exchange rate loaded for {quote_currency}"))?;
    let foreign = history
        .to_series(Currency::Foreign)?
        .reindex_forward_fill(calendar)?;
    debug!(
        "Converting {} from {quote_currency} using {}",
        history.symbol,
        rate.quote()
    );
    Ok(currency::convert(&foreign, rate)?)
}
