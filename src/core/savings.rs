//! Savings account accrual.
//!
//! Rates follow the effective-annual convention: a sub-period rate is
//! `(1 + annual_rate)^(1 / periods_per_year) - 1`, so a full year of ticks
//! always grows a balance by exactly `annual_rate` whatever the frequency.
use crate::core::error::{Result, SimulationError};
use crate::core::schedule::ContributionSchedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// When a contribution is credited relative to the accrual of its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContributionTiming {
    /// Interest is applied to the existing balance, then the contribution is
    /// added. A contribution starts earning on the following tick.
    #[default]
    AfterAccrual,
    /// The contribution is added first and earns interest within its own tick.
    BeforeAccrual,
}

/// The tick size the accrual recurrence runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccrualGranularity {
    /// One tick per contribution period.
    #[default]
    ContributionPeriod,
    /// One tick per compounding period, reported as the closing balance of
    /// each contribution period.
    CompoundingPeriod,
}

impl FromStr for AccrualGranularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "contribution_period" => Ok(Self::ContributionPeriod),
            "compounding_period" => Ok(Self::CompoundingPeriod),
            other => Err(format!(
                "unknown accrual granularity '{other}', expected contribution_period or compounding_period"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsConfig {
    /// Annual rate as a fraction, `0.02` for 2%.
    pub annual_rate: f64,
    pub compounding_periods_per_year: u32,
    pub timing: ContributionTiming,
    pub granularity: AccrualGranularity,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            annual_rate: 0.02,
            compounding_periods_per_year: 12,
            timing: ContributionTiming::default(),
            granularity: AccrualGranularity::default(),
        }
    }
}

impl SavingsConfig {
    pub fn with_rate(annual_rate: f64) -> Self {
        Self {
            annual_rate,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.annual_rate.is_finite() || self.annual_rate < -1.0 {
            return Err(SimulationError::InvalidRate(format!(
                "annual rate {} must be a finite number no lower than -1",
                self.annual_rate
            )));
        }
        if self.compounding_periods_per_year == 0 {
            return Err(SimulationError::InvalidRate(
                "compounding periods per year must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rate for one of `periods_per_year` equal sub-periods.
pub fn periodic_rate(annual_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + annual_rate).powf(1.0 / f64::from(periods_per_year)) - 1.0
}

/// Balance at the close of every contribution period.
pub fn simulate(schedule: &ContributionSchedule, config: &SavingsConfig) -> Result<Vec<f64>> {
    config.validate()?;

    let contributions_per_year = schedule.frequency().periods_per_year();
    match config.granularity {
        AccrualGranularity::ContributionPeriod => {
            let rate = periodic_rate(config.annual_rate, contributions_per_year);
            debug!(
                "Accruing {} periods at {rate} per {} period",
                schedule.periods(),
                schedule.frequency()
            );
            let mut balance = 0.0;
            Ok((0..schedule.periods())
                .map(|_| {
                    balance = step(balance, schedule.amount(), rate, config.timing);
                    balance
                })
                .collect())
        }
        AccrualGranularity::CompoundingPeriod => {
            let ticks_per_year = config.compounding_periods_per_year;
            if ticks_per_year < contributions_per_year {
                return Err(SimulationError::InvalidRate(format!(
                    "compounding {ticks_per_year} times a year is coarser than {} contributions",
                    schedule.frequency()
                )));
            }
            let rate = periodic_rate(config.annual_rate, ticks_per_year);
            Ok(accrue_by_tick(
                schedule,
                rate,
                u64::from(ticks_per_year),
                u64::from(contributions_per_year),
                config.timing,
            ))
        }
    }
}

/// Zero-interest balance: the running total of contributions.
pub fn checking_balance(schedule: &ContributionSchedule) -> Vec<f64> {
    let mut balance = 0.0;
    (0..schedule.periods())
        .map(|_| {
            balance += schedule.amount();
            balance
        })
        .collect()
}

fn step(balance: f64, contribution: f64, rate: f64, timing: ContributionTiming) -> f64 {
    match timing {
        ContributionTiming::AfterAccrual => balance * (1.0 + rate) + contribution,
        ContributionTiming::BeforeAccrual => (balance + contribution) * (1.0 + rate),
    }
}

// Tick t falls in contribution period floor(t * p / m). Contributions land on
// the first tick of a period and the last tick's balance closes it.
fn accrue_by_tick(
    schedule: &ContributionSchedule,
    rate: f64,
    ticks_per_year: u64,
    periods_per_year: u64,
    timing: ContributionTiming,
) -> Vec<f64> {
    let periods = schedule.periods() as u64;
    let total_ticks = (periods * ticks_per_year).div_ceil(periods_per_year);
    let period_of = |tick: u64| tick * periods_per_year / ticks_per_year;

    debug!("Accruing {total_ticks} ticks at {rate} across {periods} periods");

    let mut closing = Vec::with_capacity(schedule.periods());
    let mut balance = 0.0;
    let mut previous_period = None;
    for tick in 0..total_ticks {
        let period = period_of(tick);
        let contribution = if previous_period != Some(period) {
            schedule.amount()
        } else {
            0.0
        };
        balance = step(balance, contribution, rate, timing);
        previous_period = Some(period);

        if tick + 1 == total_ticks || period_of(tick + 1) != period {
            closing.push(balance);
        }
    }
    closing
}
