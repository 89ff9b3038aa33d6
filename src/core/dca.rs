//! Dollar-cost averaging simulation.
//!
//! A fixed contribution buys `amount / price` units every period. Units only
//! accumulate; the market value of a period is the units held so far marked at
//! that period's price.
use crate::core::error::{Result, SimulationError};
use crate::core::schedule::ContributionSchedule;
use crate::core::series::{Currency, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Holdings of one instrument at the close of a period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionState {
    pub date: NaiveDate,
    pub price: f64,
    pub purchased_units: f64,
    pub units: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DcaOutcome {
    pub positions: Vec<PositionState>,
}

impl DcaOutcome {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn units(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.units).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.value).collect()
    }
}

/// A home-currency priced instrument and its share of each contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub id: String,
    pub prices: PriceSeries,
    pub weight: f64,
}

impl Instrument {
    pub fn new(id: impl Into<String>, prices: PriceSeries, weight: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(SimulationError::InvalidWeight(weight));
        }
        if let Some(index) = prices
            .points()
            .iter()
            .position(|p| p.currency != Currency::Home)
        {
            return Err(SimulationError::CurrencyMismatch { index });
        }
        Ok(Self {
            id: id.into(),
            prices,
            weight,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentOutcome {
    pub id: String,
    pub weight: f64,
    pub outcome: DcaOutcome,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompositeOutcome {
    pub instruments: Vec<InstrumentOutcome>,
    pub values: Vec<f64>,
}

/// Accumulates `schedule.amount()` worth of units every period.
pub fn simulate(prices: &PriceSeries, schedule: &ContributionSchedule) -> Result<DcaOutcome> {
    schedule.ensure_periods(prices.len())?;
    if let Some((period, price)) = prices.first_invalid_price() {
        return Err(SimulationError::InvalidPrice { period, price });
    }

    let amount = schedule.amount();
    let mut units = 0.0;
    let positions = prices
        .points()
        .iter()
        .map(|point| {
            let purchased_units = amount / point.price;
            units += purchased_units;
            PositionState {
                date: point.date,
                price: point.price,
                purchased_units,
                units,
                value: units * point.price,
            }
        })
        .collect();

    Ok(DcaOutcome { positions })
}

/// Like [`simulate`] with each contribution scaled by `weight`.
pub fn simulate_weighted(
    prices: &PriceSeries,
    schedule: &ContributionSchedule,
    weight: f64,
) -> Result<DcaOutcome> {
    simulate(prices, &schedule.scaled(weight)?)
}

/// Splits every contribution across `instruments` by weight and reports the
/// combined market value per period.
pub fn simulate_composite(
    instruments: &[Instrument],
    schedule: &ContributionSchedule,
) -> Result<CompositeOutcome> {
    let total_weight: f64 = instruments.iter().map(|i| i.weight).sum();
    if (total_weight - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(SimulationError::InvalidWeight(total_weight));
    }
    for instrument in instruments {
        schedule.ensure_periods(instrument.prices.len())?;
    }
    if let Some((first, rest)) = instruments.split_first() {
        for other in rest {
            if let Some(index) = first
                .prices
                .dates()
                .zip(other.prices.dates())
                .position(|(a, b)| a != b)
            {
                return Err(SimulationError::MisalignedSeries { index });
            }
        }
    }

    let mut outcomes = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        debug!(
            "Simulating {} with weight {} over {} periods",
            instrument.id,
            instrument.weight,
            schedule.periods()
        );
        outcomes.push(InstrumentOutcome {
            id: instrument.id.clone(),
            weight: instrument.weight,
            outcome: simulate_weighted(&instrument.prices, schedule, instrument.weight)?,
        });
    }

    let values = (0..schedule.periods())
        .map(|i| {
            outcomes
                .iter()
                .map(|o| o.outcome.positions[i].value)
                .sum()
        })
        .collect();

    Ok(CompositeOutcome {
        instruments: outcomes,
        values,
    })
}
