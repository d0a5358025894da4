use std::fmt;

use crate::domain::RateSample;

pub const FAVORABLE_TEXT: &str = "Good time to buy!";
pub const UNFAVORABLE_TEXT: &str = "Bad time to buy.";
pub const UNKNOWN_TEXT: &str = "Unable to fetch exchange rate.";

/// Classification of a rate sample against the configured threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Favorable,
    Unfavorable,
    Unknown,
}

impl Classification {
    /// Display color used on the landing page
    pub const fn color(self) -> &'static str {
        match self {
            Self::Favorable => "green",
            Self::Unfavorable => "red",
            Self::Unknown => "gray",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Favorable => "favorable",
            Self::Unfavorable => "unfavorable",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Human-readable verdict on the current exchange rate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertMessage {
    text: String,
    classification: Classification,
}

impl AlertMessage {
    /// Classify `rate` against `threshold`. The comparison is strict: a rate equal to the
    /// threshold is unfavorable.
    pub fn evaluate(rate: f64, threshold: f64) -> Self {
        if rate > threshold {
            Self {
                text: FAVORABLE_TEXT.into(),
                classification: Classification::Favorable,
            }
        } else {
            Self {
                text: UNFAVORABLE_TEXT.into(),
                classification: Classification::Unfavorable,
            }
        }
    }

    /// Neutral message shown when no rate could be fetched
    pub fn unknown() -> Self {
        Self {
            text: UNKNOWN_TEXT.into(),
            classification: Classification::Unknown,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn classification(&self) -> Classification {
        self.classification
    }

    pub const fn color(&self) -> &'static str {
        self.classification.color()
    }
}

/// Everything a notifier needs to tell a subscriber about one rate sample
#[derive(Clone, Debug)]
pub struct RateAlert {
    pub sample: RateSample,
    pub message: AlertMessage,
}

impl RateAlert {
    pub fn new(sample: RateSample, threshold: f64) -> Self {
        let message = AlertMessage::evaluate(sample.value(), threshold);
        Self { sample, message }
    }
}
