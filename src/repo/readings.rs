//! Reading table: the immutable per-meter store of raw counter readings.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::{parse_clock, parse_counter, MeterId, Reading};
use crate::error::{AnalyticsError, Result};

pub const CLOCK_FIELD: &str = "Clock (8:0-0:1.0.0*255:2)";
pub const IMPORT_FIELD: &str = "Active Energy Import (3:1-0:1.8.0*255:2)";
pub const EXPORT_FIELD: &str = "Active Energy Export (3:1-0:2.8.0*255:2)";
pub const METER_FIELD: &str = "Meter";

/// Read-only handle over every meter's readings.
///
/// Built once per process and passed by reference to each component.
/// Readings keep their file order; components sort where they need to.
#[derive(Debug, Clone, Default)]
pub struct ReadingTable {
    meters: BTreeMap<MeterId, Vec<Reading>>,
}

impl ReadingTable {
    pub fn new(meters: BTreeMap<MeterId, Vec<Reading>>) -> Self {
        Self { meters }
    }

    pub fn from_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let mut meters: BTreeMap<MeterId, Vec<Reading>> = BTreeMap::new();
        for reading in readings {
            meters.entry(reading.meter_id.clone()).or_default().push(reading);
        }
        Self { meters }
    }

    /// Load a reading table from JSON.
    ///
    /// Two layouts are accepted:
    /// - `{ "<meter>": [ {row}, ... ], ... }`
    /// - `[ { "Meter": <id>, ...row }, ... ]`
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: Value = serde_json::from_reader(reader)?;
        let table = Self::from_json(raw)?;
        info!(meters = table.len(), readings = table.reading_count(), "reading table loaded");
        Ok(table)
    }

    pub fn from_json(raw: Value) -> Result<Self> {
        let mut meters: BTreeMap<MeterId, Vec<Reading>> = BTreeMap::new();
        let mut dropped = 0usize;

        match raw {
            Value::Object(by_meter) => {
                for (id, rows) in by_meter {
                    let Value::Array(rows) = rows else {
                        dropped += 1;
                        continue;
                    };
                    let meter_id = MeterId::new(&id);
                    let entry = meters.entry(meter_id.clone()).or_default();
                    for row in rows {
                        match row.as_object().and_then(|row| reading_from_row(&meter_id, row)) {
                            Some(reading) => entry.push(reading),
                            None => dropped += 1,
                        }
                    }
                }
            }
            Value::Array(rows) => {
                for row in rows {
                    let parsed = row.as_object().and_then(|row| {
                        let meter_id = meter_id_from_value(row.get(METER_FIELD)?)?;
                        reading_from_row(&meter_id, row)
                    });
                    match parsed {
                        Some(reading) => meters
                            .entry(reading.meter_id.clone())
                            .or_default()
                            .push(reading),
                        None => dropped += 1,
                    }
                }
            }
            other => {
                return Err(AnalyticsError::Validation(format!(
                    "unsupported reading table layout: expected object or array, got {}",
                    json_kind(&other)
                )))
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped malformed reading rows");
        }
        Ok(Self { meters })
    }

    pub fn readings(&self, meter: &MeterId) -> Option<&[Reading]> {
        self.meters.get(meter).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MeterId, &[Reading])> {
        self.meters.iter().map(|(id, readings)| (id, readings.as_slice()))
    }

    /// First reading of `meter` whose clock parses to exactly `at`.
    pub fn reading_at(&self, meter: &MeterId, at: NaiveDateTime) -> Option<&Reading> {
        self.readings(meter)?
            .iter()
            .find(|r| parse_clock(&r.clock).map(|ts| ts == at).unwrap_or(false))
    }

    pub fn contains(&self, meter: &MeterId) -> bool {
        self.meters.contains_key(meter)
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    pub fn reading_count(&self) -> usize {
        self.meters.values().map(Vec::len).sum()
    }
}

/// `None` when the clock or import key is absent; such rows never pair.
fn reading_from_row(meter_id: &MeterId, row: &Map<String, Value>) -> Option<Reading> {
    let clock = match row.get(CLOCK_FIELD)? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    let import = row.get(IMPORT_FIELD)?;
    Some(Reading {
        meter_id: meter_id.clone(),
        clock,
        import_cumulative: parse_counter(import),
        export_cumulative: row.get(EXPORT_FIELD).and_then(parse_counter),
    })
}

fn meter_id_from_value(value: &Value) -> Option<MeterId> {
    match value {
        Value::String(s) => Some(MeterId::new(s)),
        Value::Number(n) => Some(MeterId::new(n.to_string())),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
