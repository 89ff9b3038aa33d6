//! Contribution schedules shared by the DCA and savings simulators

use crate::core::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// How often a contribution is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContributionFrequency {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl ContributionFrequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            ContributionFrequency::Monthly => 12,
            ContributionFrequency::Quarterly => 4,
            ContributionFrequency::SemiAnnual => 2,
            ContributionFrequency::Annual => 1,
        }
    }
}

impl Display for ContributionFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ContributionFrequency::Monthly => "monthly",
                ContributionFrequency::Quarterly => "quarterly",
                ContributionFrequency::SemiAnnual => "semi-annual",
                ContributionFrequency::Annual => "annual",
            }
        )
    }
}

/// A fixed amount contributed once per period for `periods` periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionSchedule {
    amount: f64,
    frequency: ContributionFrequency,
    periods: usize,
}

impl ContributionSchedule {
    pub fn new(amount: f64, frequency: ContributionFrequency, periods: usize) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(SimulationError::InvalidContribution(amount));
        }
        Ok(Self {
            amount,
            frequency,
            periods,
        })
    }

    pub fn monthly(amount: f64, periods: usize) -> Result<Self> {
        Self::new(amount, ContributionFrequency::Monthly, periods)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn frequency(&self) -> ContributionFrequency {
        self.frequency
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Same cadence with the amount scaled by `weight`.
    pub fn scaled(&self, weight: f64) -> Result<Self> {
        Self::new(self.amount * weight, self.frequency, self.periods)
    }

    pub(crate) fn ensure_periods(&self, actual: usize) -> Result<()> {
        if self.periods != actual {
            return Err(SimulationError::LengthMismatch {
                expected: self.periods,
                actual,
            });
        }
        Ok(())
    }
}
