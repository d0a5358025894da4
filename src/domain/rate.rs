use chrono::{DateTime, Utc};

/// How the provider quote is combined with the fixed conversion constant
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFormula {
    /// `constant / quote`
    ConstantOverQuote,
    /// `quote / constant`
    QuoteOverConstant,
}

/// Cross rate derived from a single provider quote and a fixed conversion constant
#[derive(Clone, Copy, Debug)]
pub struct CrossRate {
    pub constant: f64,
    pub formula: RateFormula,
}

impl CrossRate {
    pub fn apply(&self, quote: f64) -> f64 {
        match self.formula {
            RateFormula::ConstantOverQuote => self.constant / quote,
            RateFormula::QuoteOverConstant => quote / self.constant,
        }
    }
}

/// One fetched exchange rate, never persisted
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateSample {
    value: f64,
    fetched_at: DateTime<Utc>,
}

impl RateSample {
    /// Parse a rate sample, rejecting values that are not finite and positive
    pub fn parse(value: f64, fetched_at: DateTime<Utc>) -> Result<Self, String> {
        if value.is_finite() && value > 0.0 {
            Ok(Self { value, fetched_at })
        } else {
            Err(format!("{value} is not a finite positive exchange rate"))
        }
    }

    pub const fn value(&self) -> f64 {
        self.value
    }

    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
