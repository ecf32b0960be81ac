use chrono::{Duration, NaiveDate};
use meter_analytics::config::ForecastConfig;
use meter_analytics::domain::{MeterId, Reading, RegionMapping, Series, CLOCK_FORMAT};
use meter_analytics::error::{AnalyticsError, Result};
use meter_analytics::forecast::{ForecastEngine, Horizon};
use meter_analytics::ml::{ScalerTable, SequenceModel};
use meter_analytics::series::{delta, left_pad, RegionAggregator};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn clock(hour: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (start + Duration::hours(hour as i64)).format(CLOCK_FORMAT).to_string()
}

fn readings(values: &[(Option<f64>, Option<f64>)]) -> Vec<Reading> {
    values
        .iter()
        .enumerate()
        .map(|(hour, (import, export))| Reading::new("42", clock(hour), *import, *export))
        .collect()
}

struct Flat {
    lookback: usize,
}

impl SequenceModel for Flat {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn num_series(&self) -> usize {
        1
    }

    fn predict_next(&self, window: &[f64], _series_index: usize) -> Result<f64> {
        Ok(window[window.len() - 1])
    }
}

proptest! {
    #[test]
    fn delta_count_matches_complete_pairs(
        values in prop::collection::vec(
            (prop::option::weighted(0.8, 0.0..1e6f64), prop::option::weighted(0.8, 0.0..1e6f64)),
            0..48,
        )
    ) {
        let expected = values
            .windows(2)
            .filter(|pair| pair.iter().all(|(i, e)| i.is_some() && e.is_some()))
            .count();
        let deltas = delta::compute(&readings(&values)).unwrap();
        prop_assert_eq!(deltas.len(), expected);
    }

    #[test]
    fn corrupt_interior_reading_drops_two_deltas(
        values in prop::collection::vec((0.0..1e6f64, 0.0..1e6f64), 3..48),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut values: Vec<_> = values.into_iter().map(|(i, e)| (Some(i), Some(e))).collect();
        let clean = delta::compute(&readings(&values)).unwrap().len();
        let interior = 1 + pick.index(values.len() - 2);
        values[interior].0 = None;
        let corrupted = delta::compute(&readings(&values)).unwrap().len();
        prop_assert_eq!(clean, values.len() - 1);
        prop_assert_eq!(corrupted, clean - 2);
    }

    #[test]
    fn aligned_series_keep_their_tail(
        batch in prop::collection::vec(prop::collection::vec(-1e3..1e3f64, 0..30), 1..8)
    ) {
        let longest = batch.iter().map(Vec::len).max().unwrap_or(0);
        let aligned = left_pad(&batch);
        prop_assert_eq!(aligned.len(), batch.len());
        for (out, original) in aligned.iter().zip(&batch) {
            prop_assert_eq!(out.len(), longest);
            prop_assert_eq!(&out[longest - original.len()..], original.as_slice());
        }
    }

    #[test]
    fn aggregation_is_additive_over_disjoint_meters(
        rows in prop::collection::vec(prop::collection::vec(0u32..10_000, 6), 2..10),
        split in any::<prop::sample::Index>(),
    ) {
        let series: BTreeMap<MeterId, Series> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (MeterId::from(i as u64), row.iter().map(|v| *v as f64).collect()))
            .collect();
        let ids: Vec<MeterId> = series.keys().cloned().collect();
        let (a, b) = ids.split_at(split.index(ids.len()));

        let region = |members: &[MeterId]| -> Series {
            let mapping: RegionMapping = [("R", members.to_vec())].into_iter().collect();
            RegionAggregator::new(&mapping).region_series(&series).unwrap().remove("R").unwrap()
        };

        let union = region(&ids);
        let summed: Series = region(a).iter().zip(region(b)).map(|(x, y)| x + y).collect();
        prop_assert_eq!(union, summed);
    }

    #[test]
    fn forecast_returns_exactly_horizon_values(
        history in prop::collection::vec(-50.0..50.0f64, 5..40),
        steps in 0usize..60,
    ) {
        let engine = ForecastEngine::new(
            Arc::new(Flat { lookback: 4 }),
            ScalerTable::default(),
            ForecastConfig::default(),
        );
        let data = vec![history];
        let out = engine.forecast_region(&data, 0, Horizon::Steps(steps)).unwrap();
        prop_assert_eq!(out.len(), steps);
        let out_of_range = matches!(
            engine.forecast_region(&data, 1, Horizon::Day),
            Err(AnalyticsError::IndexOutOfRange { index: 1, len: 1 })
        );
        prop_assert!(out_of_range, "row 1 of a one-row table must be out of range");
    }
}
