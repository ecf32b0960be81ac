use crate::config::DataConfig;
use crate::error::Result;

pub mod coordinates;
pub mod readings;
pub mod regions;
pub mod series;

pub use coordinates::CoordinateTable;
pub use readings::ReadingTable;
pub use regions::{load_region_mapping, RegionIndex};
pub use series::{load_series, write_series, MeterIndex};

use crate::domain::RegionMapping;

/// The source tables every component reads from, loaded once.
pub struct Repositories {
    pub readings: ReadingTable,
    pub regions: RegionMapping,
    pub coordinates: CoordinateTable,
}

impl Repositories {
    pub fn load(cfg: &DataConfig) -> Result<Self> {
        Ok(Self {
            readings: ReadingTable::load(&cfg.readings_path)?,
            regions: load_region_mapping(&cfg.region_map_path)?,
            coordinates: CoordinateTable::load(&cfg.coordinates_path)?,
        })
    }
}
