pub mod engine;
pub mod window;

pub use engine::*;
pub use window::*;

use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;

/// How far ahead to forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Horizon {
    /// One day of hourly steps.
    Day,
    /// One week of hourly steps.
    Week,
    Steps(usize),
}

impl Horizon {
    pub fn steps(&self, cfg: &ForecastConfig) -> usize {
        match self {
            Self::Day => cfg.day_steps,
            Self::Week => cfg.week_steps,
            Self::Steps(n) => *n,
        }
    }
}
