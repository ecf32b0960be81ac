//! Offline batch: readings to the processed meter and region series files.

use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::DataConfig;
use crate::domain::{Counter, MeterId, RegionMapping, Series};
use crate::error::Result;
use crate::repo::{write_series, MeterIndex, ReadingTable, RegionIndex};
use crate::series::{align_keyed, country_series, delta, RegionAggregator};

/// Aligned import series for meters and regions, rows in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSeries {
    pub meters: Vec<MeterId>,
    pub meter_rows: Vec<Series>,
    pub regions: Vec<String>,
    pub region_rows: Vec<Series>,
    pub country: Series,
}

impl ProcessedSeries {
    /// Build every series from the reading table.
    ///
    /// Meter rows follow [`MeterId::processing_order`], region rows follow
    /// region name order. All rows share one length.
    pub fn build(table: &ReadingTable, mapping: &RegionMapping) -> Result<Self> {
        let (mut keyed, length) = aligned_meter_series(table, Counter::Import)?;

        let by_region = RegionAggregator::new(mapping).region_series(&keyed)?;
        let country = country_series(&by_region)?;

        let meters = keyed.keys().cloned().sorted_by(MeterId::processing_order).collect_vec();
        let meter_rows = meters.iter().filter_map(|m| keyed.remove(m)).collect_vec();
        let (regions, region_rows): (Vec<_>, Vec<_>) = by_region.into_iter().unzip();

        info!(meters = meters.len(), regions = regions.len(), length, "built processed series");
        Ok(Self { meters, meter_rows, regions, region_rows, country })
    }

    pub fn write(&self, cfg: &DataConfig) -> Result<()> {
        write_series(&cfg.meter_series_path, &self.meter_rows)?;
        MeterIndex::new(self.meters.clone()).write(&cfg.meter_index_path)?;
        write_series(&cfg.region_series_path, &self.region_rows)?;
        RegionIndex::new(self.regions.clone()).write(&cfg.region_index_path)?;
        write_series(&cfg.country_series_path, std::slice::from_ref(&self.country))?;
        info!(
            meter_series = %cfg.meter_series_path.display(),
            region_series = %cfg.region_series_path.display(),
            country_series = %cfg.country_series_path.display(),
            "wrote processed series"
        );
        Ok(())
    }
}

/// Import and export series of one region or of the whole country.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CounterSeries {
    pub import: Series,
    pub export: Series,
}

/// Both counters summed per region, plus the country total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalConsumption {
    pub regions: BTreeMap<String, CounterSeries>,
    pub country: CounterSeries,
}

impl RegionalConsumption {
    /// Each counter is aligned on its own, so import and export lengths may differ.
    pub fn build(table: &ReadingTable, mapping: &RegionMapping) -> Result<Self> {
        let aggregator = RegionAggregator::new(mapping);
        let (import_meters, _) = aligned_meter_series(table, Counter::Import)?;
        let (export_meters, _) = aligned_meter_series(table, Counter::Export)?;
        let import = aggregator.region_series(&import_meters)?;
        let mut export = aggregator.region_series(&export_meters)?;

        let country = CounterSeries {
            import: country_series(&import)?,
            export: country_series(&export)?,
        };
        let regions = import
            .into_iter()
            .map(|(region, import)| {
                let export = export.remove(&region).unwrap_or_default();
                (region, CounterSeries { import, export })
            })
            .collect();
        Ok(Self { regions, country })
    }
}

fn aligned_meter_series(
    table: &ReadingTable,
    counter: Counter,
) -> Result<(BTreeMap<MeterId, Series>, usize)> {
    let mut keyed = table
        .iter()
        .map(|(meter, readings)| Ok((meter.clone(), delta::series(readings, counter)?)))
        .collect::<Result<BTreeMap<MeterId, Series>>>()?;
    let length = align_keyed(&mut keyed);
    Ok((keyed, length))
}

#[tracing::instrument(skip_all)]
pub fn run(
    table: &ReadingTable,
    mapping: &RegionMapping,
    cfg: &DataConfig,
) -> Result<ProcessedSeries> {
    let processed = ProcessedSeries::build(table, mapping)?;
    processed.write(cfg)?;
    Ok(processed)
}
