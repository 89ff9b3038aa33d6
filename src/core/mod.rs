//! Core business logic abstractions

pub mod cache;
pub mod comparison;
pub mod config;
pub mod currency;
pub mod dca;
pub mod error;
pub mod log;
pub mod price;
pub mod savings;
pub mod schedule;
pub mod series;
pub mod strategy;

// Re-export main types for cleaner imports
pub use currency::CurrencyRateProvider;
pub use error::SimulationError;
pub use price::{DateRange, PriceHistory, PriceProvider};
