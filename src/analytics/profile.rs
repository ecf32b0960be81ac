use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::domain::{parse_day, MeterId};
use crate::error::{AnalyticsError, Result};
use crate::repo::ReadingTable;

pub const HOURS_PER_DAY: usize = 24;

/// Hourly import deltas of one meter over one calendar day.
///
/// Slot `h` is the difference between the exact readings at `h:00` and
/// `h+1:00` of the same day. The last slot has no partner inside the day.
/// Missing slots repeat the last known value; slots before the first known
/// value stay `None`.
pub fn hourly_profile(
    table: &ReadingTable,
    meter: &MeterId,
    day: &str,
) -> Result<Vec<Option<f64>>> {
    let date = parse_day(day)?;
    if !table.contains(meter) {
        return Err(AnalyticsError::Validation(format!("unknown meter id '{meter}'")));
    }

    let hour_start = |hour: usize| -> NaiveDateTime {
        date.and_time(NaiveTime::MIN) + Duration::hours(hour as i64)
    };
    let import_at =
        |at: NaiveDateTime| table.reading_at(meter, at).and_then(|r| r.import_cumulative);

    let raw = (0..HOURS_PER_DAY).map(|hour| {
        if hour + 1 == HOURS_PER_DAY {
            return None;
        }
        match (import_at(hour_start(hour)), import_at(hour_start(hour + 1))) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    });

    let mut last = None;
    Ok(raw
        .map(|value| {
            if value.is_some() {
                last = value;
            }
            last
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reading;

    fn table() -> ReadingTable {
        ReadingTable::from_readings(vec![
            Reading::new("9", "07.06.2025 01:00:00", Some(10.0), None),
            Reading::new("9", "07.06.2025 02:00:00", Some(12.0), None),
            Reading::new("9", "07.06.2025 03:00:00", Some(15.0), None),
            Reading::new("9", "07.06.2025 05:00:00", Some(20.0), None),
            Reading::new("9", "07.06.2025 06:00:00", Some(21.0), None),
            Reading::new("9", "07.06.2025 23:00:00", Some(90.0), None),
            Reading::new("9", "08.06.2025 00:00:00", Some(99.0), None),
        ])
    }

    #[test]
    fn test_profile_forward_fills() {
        let profile = hourly_profile(&table(), &MeterId::from("9"), "07.06.2025").unwrap();
        assert_eq!(profile.len(), HOURS_PER_DAY);
        assert_eq!(profile[0], None);
        assert_eq!(profile[1], Some(2.0));
        assert_eq!(profile[2], Some(3.0));
        // 03-04 and 04-05 are missing
        assert_eq!(profile[3], Some(3.0));
        assert_eq!(profile[4], Some(3.0));
        assert_eq!(profile[5], Some(1.0));
        // the 23:00 slot never pairs across midnight
        assert_eq!(profile[23], Some(1.0));
    }

    #[test]
    fn test_unknown_meter_and_bad_day() {
        assert!(matches!(
            hourly_profile(&table(), &MeterId::from("404"), "07.06.2025"),
            Err(AnalyticsError::Validation(_))
        ));
        assert!(matches!(
            hourly_profile(&table(), &MeterId::from("9"), "2025-06-07"),
            Err(AnalyticsError::Validation(_))
        ));
    }
}
