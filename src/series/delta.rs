//! Cumulative counter readings to consumption deltas.

use chrono::NaiveDateTime;

use crate::domain::{Counter, DeltaRecord, Reading, Series};
use crate::error::Result;

/// Sort readings by timestamp.
///
/// Fails on the first unparseable timestamp. The sort is stable, so
/// readings with equal timestamps keep their input order.
fn sorted_by_time(readings: &[Reading]) -> Result<Vec<(NaiveDateTime, &Reading)>> {
    let mut timed = readings
        .iter()
        .map(|r| Ok((r.timestamp()?, r)))
        .collect::<Result<Vec<_>>>()?;
    timed.sort_by_key(|(ts, _)| *ts);
    Ok(timed)
}

/// Full delta records between consecutive readings of one meter.
///
/// A pair is skipped when any counter on either side failed to parse, so one
/// corrupt interior reading removes exactly the two deltas touching it.
pub fn compute(readings: &[Reading]) -> Result<Vec<DeltaRecord>> {
    let timed = sorted_by_time(readings)?;

    let deltas = timed
        .windows(2)
        .filter_map(|pair| {
            let (t0, earlier) = pair[0];
            let (t1, later) = pair[1];
            Some(DeltaRecord {
                meter_id: later.meter_id.clone(),
                end_timestamp: t1,
                import_delta: later.import_cumulative? - earlier.import_cumulative?,
                export_delta: later.export_cumulative? - earlier.export_cumulative?,
                elapsed: t1 - t0,
            })
        })
        .collect();

    Ok(deltas)
}

/// Single-counter delta series, as used for the processed series files.
///
/// Only the selected counter decides whether a pair is skipped.
pub fn series(readings: &[Reading], counter: Counter) -> Result<Series> {
    let timed = sorted_by_time(readings)?;

    Ok(timed
        .windows(2)
        .filter_map(|pair| Some(pair[1].1.counter(counter)? - pair[0].1.counter(counter)?))
        .collect())
}
