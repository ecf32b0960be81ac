//! Series construction: deltas, alignment and aggregation.

pub mod aggregate;
pub mod align;
pub mod delta;

pub use aggregate::{country_series, region_totals, RegionAggregator};
pub use align::{align_keyed, left_pad};
