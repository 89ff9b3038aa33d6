//! Currency conversion abstractions.
//!
//! Exchange rates are quoted as foreign units per one home unit, the way
//! Yahoo quotes `{HOME}{FOREIGN}=X` (`CADUSD=X` is the USD price of one CAD).
//! A foreign price therefore converts to the home currency by division.

use crate::core::error::{Result, SimulationError};
use crate::core::price::{DateRange, PriceHistory};
use crate::core::series::{Currency, PricePoint, PriceSeries};
use async_trait::async_trait;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Monthly history of how many `foreign` units one `home` unit buys.
    async fn fetch_rate_history(
        &self,
        home: &str,
        foreign: &str,
        range: &DateRange,
    ) -> anyhow::Result<PriceHistory>;
}

/// Yahoo symbol quoting `foreign` per one `home`.
pub fn rate_symbol(home: &str, foreign: &str) -> String {
    format!("{home}{foreign}=X")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateSeries {
    quote: String,
    rates: PriceSeries,
}

impl ExchangeRateSeries {
    pub fn new(quote: impl Into<String>, rates: PriceSeries) -> Self {
        Self {
            quote: quote.into(),
            rates,
        }
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn rates(&self) -> &PriceSeries {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// The same quote seen from the other side, `1 / rate` per period.
    pub fn invert(&self) -> Result<ExchangeRateSeries> {
        ensure_positive_rates(&self.rates)?;
        let points = self
            .rates
            .points()
            .iter()
            .map(|p| PricePoint {
                price: 1.0 / p.price,
                ..*p
            })
            .collect();
        Ok(ExchangeRateSeries {
            quote: format!("1/{}", self.quote),
            rates: PriceSeries::new(points)?,
        })
    }
}

/// Converts a foreign-currency series into the home currency.
///
/// Both series must share the same dates; aligning them (usually by
/// forward-filling onto one calendar) is the caller's job.
pub fn convert(prices: &PriceSeries, rate: &ExchangeRateSeries) -> Result<PriceSeries> {
    if prices.len() != rate.len() {
        return Err(SimulationError::LengthMismatch {
            expected: prices.len(),
            actual: rate.len(),
        });
    }
    if let Some(index) = prices
        .dates()
        .zip(rate.rates.dates())
        .position(|(a, b)| a != b)
    {
        return Err(SimulationError::MisalignedSeries { index });
    }
    if let Some(index) = prices
        .points()
        .iter()
        .position(|p| p.currency != Currency::Foreign)
    {
        return Err(SimulationError::CurrencyMismatch { index });
    }
    ensure_positive_rates(&rate.rates)?;

    let points = prices
        .points()
        .iter()
        .zip(rate.rates.points())
        .map(|(price, fx)| PricePoint {
            date: price.date,
            price: price.price / fx.price,
            currency: Currency::Home,
        })
        .collect();
    PriceSeries::new(points)
}

fn ensure_positive_rates(rates: &PriceSeries) -> Result<()> {
    match rates.first_invalid_price() {
        Some((period, value)) => Err(SimulationError::InvalidRate(format!(
            "exchange rate {value} at period {period} is not positive"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::monthly_calendar;
    use chrono::NaiveDate;

    fn calendar(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        monthly_calendar(start, end).into_iter().take(n).collect()
    }

    fn series(currency: Currency, values: &[f64]) -> PriceSeries {
        PriceSeries::from_observations(
            currency,
            calendar(values.len()).into_iter().zip(values.iter().copied()),
        )
        .unwrap()
    }

    fn cad_usd(values: &[f64]) -> ExchangeRateSeries {
        ExchangeRateSeries::new(rate_symbol("CAD", "USD"), series(Currency::Home, values))
    }

    #[test]
    fn test_convert_divides_by_rate() {
        let usd = series(Currency::Foreign, &[100.0, 150.0]);
        let rate = cad_usd(&[0.5, 0.25]);

        let cad = convert(&usd, &rate).unwrap();

        assert_eq!(cad.prices().collect::<Vec<_>>(), vec![200.0, 600.0]);
        assert!(cad.points().iter().all(|p| p.currency == Currency::Home));
        assert_eq!(cad.dates().collect::<Vec<_>>(), calendar(2));
    }

    #[test]
    fn test_round_trip_through_inverted_rate() {
        let original = [412.37, 398.02, 433.9];
        let usd = series(Currency::Foreign, &original);
        let rate = cad_usd(&[0.7931, 0.7712, 0.8015]);

        let cad = convert(&usd, &rate).unwrap();
        let cad_as_foreign = PriceSeries::from_observations(
            Currency::Foreign,
            cad.dates().zip(cad.prices()),
        )
        .unwrap();
        let back = convert(&cad_as_foreign, &rate.invert().unwrap()).unwrap();

        for (a, b) in back.prices().zip(original) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let usd = series(Currency::Foreign, &[100.0, 100.0]);
        let rate = cad_usd(&[0.8, 0.0]);
        let err = convert(&usd, &rate).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidRate(_)));
        assert!(err.to_string().contains("period 1"));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let usd = series(Currency::Foreign, &[100.0, 100.0, 100.0]);
        let rate = cad_usd(&[0.8, 0.8]);
        assert_eq!(
            convert(&usd, &rate).unwrap_err(),
            SimulationError::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_rejects_misaligned_dates() {
        let usd = series(Currency::Foreign, &[100.0, 100.0]);
        let shifted = PriceSeries::from_observations(
            Currency::Home,
            calendar(3).into_iter().skip(1).zip([0.8, 0.8]),
        )
        .unwrap();
        let rate = ExchangeRateSeries::new("CADUSD=X", shifted);
        assert_eq!(
            convert(&usd, &rate).unwrap_err(),
            SimulationError::MisalignedSeries { index: 0 }
        );
    }

    #[test]
    fn test_rejects_home_priced_input() {
        let cad = series(Currency::Home, &[100.0]);
        let rate = cad_usd(&[0.8]);
        assert_eq!(
            convert(&cad, &rate).unwrap_err(),
            SimulationError::CurrencyMismatch { index: 0 }
        );
    }

    #[test]
    fn test_rate_symbol() {
        assert_eq!(rate_symbol("CAD", "USD"), "CADUSD=X");
    }
}
