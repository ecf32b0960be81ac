//! Left-padding of ragged delta series to one common length.

use std::collections::BTreeMap;

use crate::domain::{MeterId, Series};

/// Length every series is padded to: the longest input.
pub fn target_length(series: &[Series]) -> usize {
    series.iter().map(Vec::len).max().unwrap_or(0)
}

/// First nonzero value of a series, or `0.0` when there is none.
pub fn seed(series: &[f64]) -> f64 {
    series.iter().copied().find(|v| *v != 0.0).unwrap_or(0.0)
}

/// Prepend `seed` until `series` reaches `length`. Longer input is returned unchanged.
pub fn pad_to(series: &[f64], length: usize) -> Series {
    let need = length.saturating_sub(series.len());
    if need == 0 {
        return series.to_vec();
    }
    let mut padded = vec![seed(series); need];
    padded.extend_from_slice(series);
    padded
}

/// Align a batch of series to the longest one.
///
/// Padding goes on the oldest side only; each original sequence ends up as
/// the unchanged tail of its output.
pub fn left_pad(series: &[Series]) -> Vec<Series> {
    let length = target_length(series);
    series.iter().map(|s| pad_to(s, length)).collect()
}

/// Align a keyed batch in place and return the common length.
pub fn align_keyed(series: &mut BTreeMap<MeterId, Series>) -> usize {
    let length = series.values().map(Vec::len).max().unwrap_or(0);
    for s in series.values_mut() {
        if s.len() < length {
            *s = pad_to(s, length);
        }
    }
    length
}
