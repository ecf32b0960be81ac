pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod preprocess;
pub mod repo;
pub mod series;
pub mod snapshot;
pub mod telemetry;

pub use error::{AnalyticsError, Result};
