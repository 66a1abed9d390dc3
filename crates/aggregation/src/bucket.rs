//! Minute bucketing of the ordered record sequence.

use chrono::NaiveDateTime;
use tickbar_core::{truncate_to_minute, TickRecord};

/// One contiguous group of records sharing a truncated-minute key.
#[derive(Debug)]
pub struct MinuteGroup<'a> {
    /// Window start: timestamp truncated to the minute.
    pub minute: NaiveDateTime,
    /// Records in the window, in chronological order.
    pub ticks: &'a [TickRecord],
}

/// Partition a time-ordered slice into contiguous minute groups.
///
/// A single linear pass, not a re-sort: group boundaries occur exactly
/// where the truncated-minute value changes. Minutes with no records
/// produce no group, so bars stay sparse over the session.
pub fn bucket_by_minute(records: &[TickRecord]) -> Vec<MinuteGroup<'_>> {
    let mut groups = Vec::new();
    let mut start = 0;

    while start < records.len() {
        let minute = truncate_to_minute(records[start].timestamp);
        let mut end = start + 1;
        while end < records.len() && truncate_to_minute(records[end].timestamp) == minute {
            end += 1;
        }
        groups.push(MinuteGroup {
            minute,
            ticks: &records[start..end],
        });
        start = end;
    }

    groups
}
