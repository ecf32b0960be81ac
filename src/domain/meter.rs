use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{AnalyticsError, Result};

/// Timestamp layout used by the meter clock column, e.g. `07.06.2025 13:00:00`.
pub const CLOCK_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Day layout used for daily queries, e.g. `07.06.2025`.
pub const DAY_FORMAT: &str = "%d.%m.%Y";

/// Ordered numeric deltas for one meter or region.
pub type Series = Vec<f64>;

/// Normalized meter identifier.
///
/// Input files mix integer and string keys for the same meter. Both
/// normalize to the same trimmed string, so `14461231` and `"14461231"`
/// compare equal and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MeterId(String);

impl MeterId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordering used for processed series rows: shorter ids first, then text.
    pub fn processing_order(a: &MeterId, b: &MeterId) -> Ordering {
        a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0))
    }
}

impl fmt::Display for MeterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MeterId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<u64> for MeterId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for MeterId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for MeterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Unsigned(id) => MeterId::from(id),
            RawId::Signed(id) => MeterId::from(id),
            RawId::Text(id) => MeterId::new(id),
        })
    }
}

/// Which cumulative counter a series is built from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Counter {
    Import,
    Export,
}

/// One raw meter reading.
///
/// The clock is kept as the raw text so that a bad timestamp surfaces as a
/// `ParseError` where it is used, not at load time. Counter values are
/// `None` when the raw field was missing or unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub meter_id: MeterId,
    pub clock: String,
    pub import_cumulative: Option<f64>,
    pub export_cumulative: Option<f64>,
}

impl Reading {
    pub fn new(
        meter_id: impl Into<MeterId>,
        clock: impl Into<String>,
        import_cumulative: Option<f64>,
        export_cumulative: Option<f64>,
    ) -> Self {
        Self {
            meter_id: meter_id.into(),
            clock: clock.into(),
            import_cumulative,
            export_cumulative,
        }
    }

    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        parse_clock(&self.clock)
    }

    pub fn counter(&self, counter: Counter) -> Option<f64> {
        match counter {
            Counter::Import => self.import_cumulative,
            Counter::Export => self.export_cumulative,
        }
    }
}

/// Consumption between two consecutive readings of one meter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRecord {
    pub meter_id: MeterId,
    pub end_timestamp: NaiveDateTime,
    pub import_delta: f64,
    pub export_delta: f64,
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_seconds")]
    pub elapsed: Duration,
}

fn serialize_seconds<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(elapsed.num_seconds())
}

pub fn parse_clock(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), CLOCK_FORMAT)
        .map_err(|e| AnalyticsError::Parse(format!("invalid timestamp '{raw}': {e}")))
}

pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DAY_FORMAT)
        .map_err(|e| {
            AnalyticsError::Validation(format!("invalid day '{raw}' (expected DD.MM.YYYY): {e}"))
        })
}

/// Lenient conversion of a raw counter cell.
///
/// Numbers pass through, strings are trimmed and may use `,` as the decimal
/// separator. Empty strings, non-numeric text, null and NaN all yield `None`.
pub fn parse_counter(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let s = s.trim().replace(',', ".");
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| !v.is_nan())
}
