//! Time-indexed price series and the monthly calendar they are aligned to

use crate::core::error::{Result, SimulationError};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which side of the conversion a price is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Home,
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub currency: Currency,
}

/// An ordered price series with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = SimulationError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].date <= pair[0].date)
        {
            return Err(SimulationError::UnorderedTimestamps { index: index + 1 });
        }
        Ok(Self { points })
    }

    /// Builds a series where every observation shares one currency.
    pub fn from_observations<I>(currency: Currency, observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let points = observations
            .into_iter()
            .map(|(date, price)| PricePoint {
                date,
                price,
                currency,
            })
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// Returns the first index where a price is zero, negative or not finite.
    pub(crate) fn first_invalid_price(&self) -> Option<(usize, f64)> {
        self.points
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.price.is_finite() && p.price > 0.0))
            .map(|(i, p)| (i, p.price))
    }

    /// Projects the series onto `calendar`, carrying the most recent observation
    /// forward into each calendar date.
    ///
    /// A calendar date earlier than every observation cannot be filled and is
    /// reported as [`SimulationError::MissingObservation`].
    pub fn reindex_forward_fill(&self, calendar: &[NaiveDate]) -> Result<PriceSeries> {
        let mut points = Vec::with_capacity(calendar.len());
        let mut cursor = 0;
        let mut last: Option<&PricePoint> = None;

        for &date in calendar {
            while cursor < self.points.len() && self.points[cursor].date <= date {
                last = Some(&self.points[cursor]);
                cursor += 1;
            }
            let observed = last.ok_or(SimulationError::MissingObservation { date })?;
            points.push(PricePoint {
                date,
                price: observed.price,
                currency: observed.currency,
            });
        }

        PriceSeries::new(points)
    }
}

/// Every first-of-month date within `[start, end]`.
pub fn monthly_calendar(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let Some(mut current) = first_month_start_on_or_after(start) else {
        return dates;
    };
    while current <= end {
        dates.push(current);
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

fn first_month_start_on_or_after(date: NaiveDate) -> Option<NaiveDate> {
    let month_start = date.with_day(1)?;
    if month_start == date {
        Some(date)
    } else {
        month_start.checked_add_months(Months::new(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let result = PriceSeries::from_observations(
            Currency::Home,
            [
                (date(2021, 1, 1), 10.0),
                (date(2021, 3, 1), 11.0),
                (date(2021, 2, 1), 12.0),
            ],
        );
        assert_eq!(
            result.unwrap_err(),
            SimulationError::UnorderedTimestamps { index: 2 }
        );
    }

    #[test]
    fn test_deserialize_rejects_unordered_dates() {
        let json = r#"[
            {"date": "2021-02-01", "price": 10.0, "currency": "Home"},
            {"date": "2021-01-01", "price": 11.0, "currency": "Home"}
        ]"#;
        let err = serde_json::from_str::<PriceSeries>(json).unwrap_err();
        assert!(err.to_string().contains("not strictly increasing"));

        let series = PriceSeries::from_observations(
            Currency::Home,
            [(date(2021, 1, 1), 10.0), (date(2021, 2, 1), 11.0)],
        )
        .unwrap();
        let encoded = serde_json::to_string(&series).unwrap();
        assert_eq!(serde_json::from_str::<PriceSeries>(&encoded).unwrap(), series);
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = PriceSeries::from_observations(
            Currency::Home,
            [(date(2021, 1, 1), 10.0), (date(2021, 1, 1), 11.0)],
        );
        assert!(matches!(
            result,
            Err(SimulationError::UnorderedTimestamps { index: 1 })
        ));
    }

    #[test]
    fn test_monthly_calendar_starts_on_next_month_start() {
        let calendar = monthly_calendar(date(2021, 1, 15), date(2021, 4, 1));
        assert_eq!(
            calendar,
            vec![date(2021, 2, 1), date(2021, 3, 1), date(2021, 4, 1)]
        );
    }

    #[test]
    fn test_monthly_calendar_includes_start_on_month_start() {
        let calendar = monthly_calendar(date(2021, 1, 1), date(2021, 2, 28));
        assert_eq!(calendar, vec![date(2021, 1, 1), date(2021, 2, 1)]);
    }

    #[test]
    fn test_monthly_calendar_empty_for_inverted_range() {
        assert!(monthly_calendar(date(2022, 1, 1), date(2021, 1, 1)).is_empty());
        assert!(monthly_calendar(date(2021, 1, 2), date(2021, 1, 31)).is_empty());
    }

    #[test]
    fn test_reindex_forward_fills_gaps() {
        let series = PriceSeries::from_observations(
            Currency::Foreign,
            [
                (date(2021, 1, 1), 10.0),
                (date(2021, 3, 1), 12.0),
                (date(2021, 3, 20), 13.0),
            ],
        )
        .unwrap();
        let calendar = monthly_calendar(date(2021, 1, 1), date(2021, 5, 1));

        let filled = series.reindex_forward_fill(&calendar).unwrap();

        assert_eq!(filled.len(), 5);
        assert_eq!(
            filled.prices().collect::<Vec<_>>(),
            vec![10.0, 10.0, 12.0, 13.0, 13.0]
        );
        assert!(filled.points().iter().all(|p| p.currency == Currency::Foreign));
        assert_eq!(filled.dates().collect::<Vec<_>>(), calendar);
    }

    #[test]
    fn test_reindex_fails_before_first_observation() {
        let series =
            PriceSeries::from_observations(Currency::Home, [(date(2021, 2, 1), 10.0)]).unwrap();
        let calendar = monthly_calendar(date(2021, 1, 1), date(2021, 2, 1));

        assert_eq!(
            series.reindex_forward_fill(&calendar).unwrap_err(),
            SimulationError::MissingObservation {
                date: date(2021, 1, 1)
            }
        );
    }

    #[test]
    fn test_first_invalid_price() {
        let series = PriceSeries::from_observations(
            Currency::Home,
            [
                (date(2021, 1, 1), 10.0),
                (date(2021, 2, 1), -1.0),
                (date(2021, 3, 1), 0.0),
            ],
        )
        .unwrap();
        assert_eq!(series.first_invalid_price(), Some((1, -1.0)));
    }
}
