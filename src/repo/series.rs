//! Processed series files written by preprocessing and read by forecasting.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::domain::{MeterId, Series};
use crate::error::{AnalyticsError, Result};

/// Read an array-of-arrays series file and check that every row has the same length.
pub fn load_series(path: &Path) -> Result<Vec<Series>> {
    let reader = BufReader::new(File::open(path)?);
    let rows: Vec<Series> = serde_json::from_reader(reader)?;
    if let Some(first) = rows.first() {
        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != first.len()) {
            return Err(AnalyticsError::Validation(format!(
                "{}: row {row} has length {}, expected {}",
                path.display(),
                bad.len(),
                first.len()
            )));
        }
    }
    Ok(rows)
}

pub fn write_series(path: &Path, rows: &[Series]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

/// Companion file for the processed meter series: meter ids in row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterIndex {
    pub meters: Vec<MeterId>,
}

impl MeterIndex {
    pub fn new(meters: Vec<MeterId>) -> Self {
        Self { meters }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Row of a meter. Unknown meters are a request error, never row 0.
    pub fn position(&self, meter: &MeterId) -> Result<usize> {
        self.meters
            .iter()
            .position(|m| m == meter)
            .ok_or_else(|| AnalyticsError::Validation(format!("unknown meter id '{meter}'")))
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }
}
