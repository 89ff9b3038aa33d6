use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::currency::{CurrencyRateProvider, rate_symbol};
use crate::core::price::{DateRange, PriceHistory, PriceProvider};
use crate::providers::util::{RetryPolicy, with_retry};

pub type HistoryCache = Arc<dyn Cache<String, PriceHistory>>;

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    currency: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Pairs bar timestamps with adjusted closes (plain closes when Yahoo sends
/// no adjusted series). Bars without a value are dropped so the gap can be
/// forward-filled later.
fn extract_observations(item: &ChartItem) -> Vec<(NaiveDate, f64)> {
    let (Some(timestamps), Some(indicators)) = (&item.timestamp, &item.indicators) else {
        return Vec::new();
    };
    let closes = indicators
        .adjclose
        .as_ref()
        .and_then(|a| a.first())
        .and_then(|a| a.adjclose.as_ref())
        .or_else(|| indicators.quote.first().and_then(|q| q.close.as_ref()));
    let Some(closes) = closes else {
        return Vec::new();
    };

    let mut observations: Vec<(NaiveDate, f64)> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = Utc.timestamp_opt(*ts, 0).single()?.date_naive();
            close.map(|price| (date, price))
        })
        .collect();
    observations.sort_by_key(|(date, _)| *date);
    observations.dedup_by_key(|(date, _)| *date);
    observations
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Monthly bars from the v8 chart endpoint, shared by the price and
/// currency providers.
struct ChartClient {
    base_url: String,
    retry: RetryPolicy,
}

impl ChartClient {
    async fn monthly_history(&self, symbol: &str, range: &DateRange) -> Result<PriceHistory> {
        // period2 is exclusive, so ask for the whole end day
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1mo&period1={}&period2={}",
            self.base_url,
            symbol,
            unix_seconds(range.start),
            unix_seconds(range.end) + 86_400
        );
        debug!("Requesting monthly history from {}", url);

        let client = reqwest::Client::builder().user_agent("dcx/1.0").build()?;
        let data: YahooChartResponse = with_retry(
            || async {
                client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<YahooChartResponse>()
                    .await
            },
            self.retry,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if let Some(error) = data.chart.error {
            return Err(anyhow!(
                "Yahoo error for {}: {}",
                symbol,
                error.description.unwrap_or_else(|| "unknown".to_string())
            ));
        }
        let item = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let observations = extract_observations(&item);
        if observations.is_empty() {
            return Err(anyhow!("No price history found for symbol: {}", symbol));
        }
        debug!("Received {} monthly bars for {}", observations.len(), symbol);

        Ok(PriceHistory {
            symbol: symbol.to_string(),
            currency: item.meta.currency.unwrap_or_default(),
            observations,
        })
    }
}

fn cache_key(symbol: &str, range: &DateRange) -> String {
    format!("{symbol}:{range}")
}

pub struct YahooFinanceProvider {
    chart: ChartClient,
    cache: HistoryCache,
    ttl: Option<Duration>,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, cache: HistoryCache) -> Self {
        YahooFinanceProvider {
            chart: ChartClient {
                base_url: base_url.to_string(),
                retry: RetryPolicy::default(),
            },
            cache,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.chart.retry = retry;
        self
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip_all,
        fields(symbol = %symbol, range = %range)
    )]
    async fn fetch_history(&self, symbol: &str, range: &DateRange) -> Result<PriceHistory> {
        let key = cache_key(symbol, range);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let history = self.chart.monthly_history(symbol, range).await?;
        self.cache.put(key, history.clone(), self.ttl).await;
        Ok(history)
    }
}

pub struct YahooCurrencyProvider {
    chart: ChartClient,
    cache: HistoryCache,
    ttl: Option<Duration>,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str, cache: HistoryCache) -> Self {
        YahooCurrencyProvider {
            chart: ChartClient {
                base_url: base_url.to_string(),
                retry: RetryPolicy::default(),
            },
            cache,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.chart.retry = retry;
        self
    }
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    async fn fetch_rate_history(
        &self,
        home: &str,
        foreign: &str,
        range: &DateRange,
    ) -> Result<PriceHistory> {
        let symbol = rate_symbol(home, foreign);
        let key = cache_key(&symbol, range);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let history = self.chart.monthly_history(&symbol, range).await?;
        self.cache.put(key, history.clone(), self.ttl).await;
        Ok(history)
    }
}
