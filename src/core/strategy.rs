//! Investment strategies to compare against the savings account
use serde::{Deserialize, Serialize};

fn full_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StrategyComponent {
    pub symbol: String,
    #[serde(default = "full_weight")]
    pub weight: f64,
    /// Quote currency. Falls back to the currency the provider reports.
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Strategy {
    pub key: String,
    pub name: String,
    pub components: Vec<StrategyComponent>,
}

impl Strategy {
    fn single(key: &str, name: &str, symbol: &str, currency: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            components: vec![StrategyComponent {
                symbol: symbol.to_string(),
                weight: 1.0,
                currency: Some(currency.to_string()),
            }],
        }
    }
}

pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy::single("sp500", "S&P 500 Index (VOO)", "VOO", "USD"),
        Strategy::single("emerging", "Emerging Market Index (VWO)", "VWO", "USD"),
        Strategy {
            key: "sixty-forty".to_string(),
            name: "60:40 Split (S&P 500:US T-Bonds)".to_string(),
            components: vec![
                StrategyComponent {
                    symbol: "VOO".to_string(),
                    weight: 0.6,
                    currency: Some("USD".to_string()),
                },
                StrategyComponent {
                    symbol: "IEF".to_string(),
                    weight: 0.4,
                    currency: Some("USD".to_string()),
                },
            ],
        },
        Strategy::single("tsx", "TSX Index Fund (XIU)", "XIU.TO", "CAD"),
        Strategy::single("nifty", "Nifty Index Fund (INDY)", "INDY", "USD"),
    ]
}

/// Looks a strategy up by key, ignoring case.
pub fn find_strategy<'a>(strategies: &'a [Strategy], key: &str) -> Option<&'a Strategy> {
    strategies.iter().find(|s| s.key.eq_ignore_ascii_case(key))
}
