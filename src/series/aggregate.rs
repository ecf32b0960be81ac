//! Hierarchical sums: meters into regions, regions into the country.

use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{Counter, MeterId, Reading, RegionMapping, Series};
use crate::error::{AnalyticsError, Result};
use crate::repo::ReadingTable;

/// Sums aligned per-meter series into per-region series.
pub struct RegionAggregator<'a> {
    mapping: &'a RegionMapping,
}

impl<'a> RegionAggregator<'a> {
    pub fn new(mapping: &'a RegionMapping) -> Self {
        Self { mapping }
    }

    /// One series per region, keyed and ordered by region name.
    ///
    /// Position `i` of every input must refer to the same time slot. A mapped
    /// meter that has no series contributes an explicit zero series, and a
    /// region without members sums to zeros.
    pub fn region_series(
        &self,
        meters: &BTreeMap<MeterId, Series>,
    ) -> Result<BTreeMap<String, Series>> {
        let length = common_length(meters.iter().map(|(id, s)| (id.as_str(), s.as_slice())))?;

        let mut out = BTreeMap::new();
        for (region, members) in self.mapping.regions() {
            let mut total = vec![0.0; length];
            for meter in members {
                match meters.get(meter) {
                    Some(series) => add_assign(&mut total, series),
                    None => debug!(%meter, region, "mapped meter has no series, counted as zero"),
                }
            }
            out.insert(region.to_string(), total);
        }
        Ok(out)
    }
}

/// Country series: the first region's series plus every remaining region.
///
/// With no regions the result is empty.
pub fn country_series(regions: &BTreeMap<String, Series>) -> Result<Series> {
    common_length(regions.iter().map(|(name, s)| (name.as_str(), s.as_slice())))?;

    let mut iter = regions.values();
    let Some(first) = iter.next() else {
        return Ok(Vec::new());
    };
    let mut total = first.clone();
    for series in iter {
        add_assign(&mut total, series);
    }
    Ok(total)
}

/// Whole-period import per region: last minus first parseable import of each
/// member meter, in time order. Meters with fewer than two parseable imports
/// count as zero.
pub fn region_totals(
    table: &ReadingTable,
    mapping: &RegionMapping,
) -> Result<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for (region, members) in mapping.regions() {
        let mut total = 0.0;
        for meter in members {
            if let Some(readings) = table.readings(meter) {
                total += meter_total(readings)?;
            }
        }
        out.insert(region.to_string(), total);
    }
    Ok(out)
}

fn meter_total(readings: &[Reading]) -> Result<f64> {
    let mut timed = readings
        .iter()
        .filter_map(|r| r.counter(Counter::Import).map(|v| (r, v)))
        .map(|(r, v)| Ok((r.timestamp()?, v)))
        .collect::<Result<Vec<_>>>()?;
    timed.sort_by_key(|(ts, _)| *ts);

    Ok(match (timed.first(), timed.last()) {
        (Some((_, first)), Some((_, last))) if timed.len() >= 2 => last - first,
        _ => 0.0,
    })
}

fn add_assign(total: &mut [f64], series: &[f64]) {
    for (acc, v) in total.iter_mut().zip(series) {
        *acc += v;
    }
}

fn common_length<'s>(mut series: impl Iterator<Item = (&'s str, &'s [f64])>) -> Result<usize> {
    let Some((_, first)) = series.next() else {
        return Ok(0);
    };
    let length = first.len();
    for (name, s) in series {
        if s.len() != length {
            return Err(AnalyticsError::Validation(format!(
                "series '{name}' has length {}, expected {length}; align before aggregating",
                s.len()
            )));
        }
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::align::align_keyed;

    fn ids(ids: &[&str]) -> Vec<MeterId> {
        ids.iter().map(|id| MeterId::from(*id)).collect()
    }

    #[test]
    fn test_aligned_meters_sum_into_region() {
        let mut meters = BTreeMap::new();
        meters.insert(MeterId::from("1"), vec![1.0, 2.0, 3.0]);
        meters.insert(MeterId::from("2"), vec![5.0, 6.0]);
        align_keyed(&mut meters);

        let mapping: RegionMapping = [("Balti", ids(&["1", "2"]))].into_iter().collect();
        let regions = RegionAggregator::new(&mapping).region_series(&meters).unwrap();
        assert_eq!(regions["Balti"], vec![6.0, 7.0, 9.0]);
    }

    #[test]
    fn test_missing_meter_and_empty_region_are_zero() {
        let mut meters = BTreeMap::new();
        meters.insert(MeterId::from("1"), vec![1.0, 1.0]);

        let mapping: RegionMapping = [
            ("Balti", ids(&["1", "404"])),
            ("Orhei", ids(&[])),
        ]
        .into_iter()
        .collect();
        let regions = RegionAggregator::new(&mapping).region_series(&meters).unwrap();
        assert_eq!(regions["Balti"], vec![1.0, 1.0]);
        assert_eq!(regions["Orhei"], vec![0.0, 0.0]);
    }

    #[test]
    fn test_unaligned_input_is_rejected() {
        let mut meters = BTreeMap::new();
        meters.insert(MeterId::from("1"), vec![1.0, 1.0]);
        meters.insert(MeterId::from("2"), vec![1.0]);
        let mapping: RegionMapping = [("Balti", ids(&["1", "2"]))].into_iter().collect();
        let err = RegionAggregator::new(&mapping).region_series(&meters).unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation(_)));
    }

    #[test]
    fn test_country_series() {
        let mut regions = BTreeMap::new();
        regions.insert("A".to_string(), vec![1.0, 2.0]);
        regions.insert("B".to_string(), vec![10.0, 20.0]);
        regions.insert("C".to_string(), vec![100.0, 200.0]);
        assert_eq!(country_series(&regions).unwrap(), vec![111.0, 222.0]);
        assert!(country_series(&BTreeMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_region_totals() {
        let table = ReadingTable::from_readings(vec![
            Reading::new("1", "07.06.2025 02:00:00", Some(9.0), None),
            Reading::new("1", "07.06.2025 00:00:00", Some(4.0), None),
            Reading::new("1", "07.06.2025 01:00:00", None, None),
            Reading::new("2", "07.06.2025 00:00:00", Some(3.0), None),
            Reading::new("3", "07.06.2025 00:00:00", Some(1.0), None),
            Reading::new("3", "07.06.2025 05:00:00", Some(2.5), None),
        ]);
        let mapping: RegionMapping = [
            ("Balti", ids(&["1", "2"])),
            ("Cahul", ids(&["3", "missing"])),
        ]
        .into_iter()
        .collect();
        let totals = region_totals(&table, &mapping).unwrap();
        assert_eq!(totals["Balti"], 5.0);
        assert_eq!(totals["Cahul"], 1.5);
    }
}
