//! Pricing abstractions and core types

use crate::core::error::Result as SimulationResult;
use crate::core::series::{Currency, PriceSeries};
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Inclusive range of dates to fetch and simulate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            bail!("Invalid date range: {start} is after {end}");
        }
        Ok(Self { start, end })
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Raw monthly observations for one symbol as reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub currency: String,
    pub observations: Vec<(NaiveDate, f64)>,
}

impl PriceHistory {
    pub fn to_series(&self, currency: Currency) -> SimulationResult<PriceSeries> {
        PriceSeries::from_observations(currency, self.observations.iter().copied())
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_history(&self, symbol: &str, range: &DateRange) -> Result<PriceHistory>;
}
