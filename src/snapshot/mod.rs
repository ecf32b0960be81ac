//! Point-in-time regional consumption snapshot for map display.

pub mod color;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::{parse_clock, MeterId, RegionMapping, RegionSnapshot, SnapshotStats};
use crate::error::{AnalyticsError, Result};
use crate::repo::{CoordinateTable, ReadingTable};

pub use color::color_for;

#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionSnapshot {
    pub timestamp: NaiveDateTime,
    pub previous: NaiveDateTime,
    pub stats: SnapshotStats,
    pub regions: BTreeMap<String, RegionSnapshot>,
}

pub struct SnapshotClassifier<'a> {
    readings: &'a ReadingTable,
    mapping: &'a RegionMapping,
    coordinates: &'a CoordinateTable,
    window: Duration,
}

impl<'a> SnapshotClassifier<'a> {
    pub fn new(
        readings: &'a ReadingTable,
        mapping: &'a RegionMapping,
        coordinates: &'a CoordinateTable,
    ) -> Self {
        Self {
            readings,
            mapping,
            coordinates,
            window: Duration::hours(1),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Classify regional consumption over the window ending at `at`.
    ///
    /// Only readings at exactly `at` and `at - window` are used. A meter
    /// missing either one contributes zero to its region.
    #[tracing::instrument(skip(self))]
    pub fn classify(&self, at: &str) -> Result<ConsumptionSnapshot> {
        let timestamp = parse_clock(at)
            .map_err(|e| AnalyticsError::Validation(format!("snapshot time: {e}")))?;
        let previous = timestamp - self.window;

        let consumption: BTreeMap<String, f64> = self
            .mapping
            .regions()
            .map(|(region, meters)| {
                let total = meters
                    .iter()
                    .map(|meter| self.meter_delta(meter, previous, timestamp))
                    .sum::<f64>();
                (region.to_string(), total)
            })
            .collect();

        let stats = summarize(consumption.values().copied());

        let regions = consumption
            .into_iter()
            .map(|(region, consumption)| {
                let coordinates = self.coordinates.get(&region);
                if coordinates.is_none() {
                    debug!(%region, "no coordinates for region");
                }
                let entry = RegionSnapshot {
                    consumption,
                    color: color_for(consumption, stats.min, stats.max),
                    coordinates,
                };
                (region, entry)
            })
            .collect::<BTreeMap<_, _>>();

        info!(regions = regions.len(), min = stats.min, max = stats.max, "snapshot classified");
        Ok(ConsumptionSnapshot { timestamp, previous, stats, regions })
    }

    fn meter_delta(
        &self,
        meter: &MeterId,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    ) -> f64 {
        let earlier = self
            .readings
            .reading_at(meter, previous)
            .and_then(|r| r.import_cumulative);
        let later = self
            .readings
            .reading_at(meter, timestamp)
            .and_then(|r| r.import_cumulative);
        match (earlier, later) {
            (Some(earlier), Some(later)) => later - earlier,
            _ => {
                debug!(%meter, "meter lacks an exact reading at snapshot bounds, counted as zero");
                0.0
            }
        }
    }
}

fn summarize(values: impl Iterator<Item = f64>) -> SnapshotStats {
    let (mut min, mut max, mut sum, mut count) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize);
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        count += 1;
    }
    if count == 0 {
        return SnapshotStats::default();
    }
    SnapshotStats { min, max, avg: sum / count as f64 }
}
