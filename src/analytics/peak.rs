//! Largest single-interval import of a meter on one day.

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::Serialize;

use crate::domain::{parse_day, MeterId};
use crate::error::Result;
use crate::repo::ReadingTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum IntervalKind {
    #[strum(serialize = "15-minute")]
    #[serde(rename = "15-minute")]
    FifteenMinute,
    #[strum(serialize = "30-minute")]
    #[serde(rename = "30-minute")]
    ThirtyMinute,
    #[strum(serialize = "1-hour")]
    #[serde(rename = "1-hour")]
    Hourly,
    #[strum(serialize = "any-interval")]
    #[serde(rename = "any-interval")]
    Any,
    #[strum(serialize = "absolute-difference")]
    #[serde(rename = "absolute-difference")]
    AbsoluteDifference,
}

/// Gap tiers tried in order; the first tier with any positive delta wins.
const TIERS: [(IntervalKind, i64, i64); 4] = [
    (IntervalKind::FifteenMinute, 840, 960),
    (IntervalKind::ThirtyMinute, 1680, 1920),
    (IntervalKind::Hourly, 3300, 3900),
    (IntervalKind::Any, 60, 86400),
];

const FALLBACK_GAP_SECONDS: (i64, i64) = (60, 7200);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub energy: f64,
    pub energy_start: f64,
    pub energy_end: f64,
    pub minutes: f64,
    pub kind: IntervalKind,
}

/// Find the interval with the largest import increase for `meter` on `day`.
///
/// Returns `None` when the day has fewer than two usable readings or no
/// interval qualifies.
pub fn find_peak_interval(
    table: &ReadingTable,
    meter: &MeterId,
    day: &str,
) -> Result<Option<PeakInterval>> {
    let date = parse_day(day)?;
    let points = day_points(table, meter, date);
    if points.len() < 2 {
        return Ok(None);
    }

    for (kind, min_gap, max_gap) in TIERS {
        let candidates = intervals(&points, kind, move |gap, diff| {
            (min_gap..=max_gap).contains(&gap) && diff > 0.0
        });
        if let Some(peak) = largest(candidates) {
            return Ok(Some(peak));
        }
    }

    let (min_gap, max_gap) = FALLBACK_GAP_SECONDS;
    let fallback = intervals(&points, IntervalKind::AbsoluteDifference, move |gap, diff| {
        (min_gap..=max_gap).contains(&gap) && diff != 0.0
    })
    .map(|mut p| {
        p.energy = p.energy.abs();
        p
    });
    Ok(largest(fallback))
}

/// Parseable readings on `date`, first occurrence per timestamp, in time order.
fn day_points(table: &ReadingTable, meter: &MeterId, date: NaiveDate) -> Vec<(NaiveDateTime, f64)> {
    table
        .readings(meter)
        .unwrap_or_default()
        .iter()
        .filter_map(|r| Some((r.timestamp().ok()?, r.import_cumulative?)))
        .filter(|(ts, _)| ts.date() == date)
        .unique_by(|(ts, _)| *ts)
        .sorted_by_key(|(ts, _)| *ts)
        .collect()
}

fn intervals<'p>(
    points: &'p [(NaiveDateTime, f64)],
    kind: IntervalKind,
    accept: impl Fn(i64, f64) -> bool + 'p,
) -> impl Iterator<Item = PeakInterval> + 'p {
    points.iter().tuple_windows().filter_map(move |(&(t0, e0), &(t1, e1))| {
        let gap = (t1 - t0).num_seconds();
        let diff = e1 - e0;
        accept(gap, diff).then(|| PeakInterval {
            start: t0,
            end: t1,
            energy: diff,
            energy_start: e0,
            energy_end: e1,
            minutes: gap as f64 / 60.0,
            kind,
        })
    })
}

// Ties keep the earliest interval.
fn largest(candidates: impl Iterator<Item = PeakInterval>) -> Option<PeakInterval> {
    candidates.fold(None, |best: Option<PeakInterval>, p| match best {
        Some(b) if b.energy >= p.energy => Some(b),
        _ => Some(p),
    })
}
