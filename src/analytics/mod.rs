//! Per-meter day views and the tariff estimate.

pub mod peak;
pub mod profile;
pub mod tariff;

pub use peak::{find_peak_interval, IntervalKind, PeakInterval};
pub use profile::{hourly_profile, HOURS_PER_DAY};
pub use tariff::{dynamic_price, hourly_consumption};
