//! Calendar-day buckets for list views.

use crate::types::Record;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

/// Records bucketed by calendar day.
///
/// Days enumerate newest first. Within a bucket, records keep the order they
/// had in the input.
#[derive(Debug, Clone)]
pub struct DayGroups<R> {
    buckets: BTreeMap<NaiveDate, Vec<R>>,
}

impl<R> DayGroups<R> {
    /// Days that have at least one record, newest first
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.buckets.keys().rev().copied()
    }

    /// `(day, records)` pairs, newest day first
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[R])> + '_ {
        self.buckets
            .iter()
            .rev()
            .map(|(day, records)| (*day, records.as_slice()))
    }

    pub fn get(&self, day: NaiveDate) -> Option<&[R]> {
        self.buckets.get(&day).map(Vec::as_slice)
    }

    /// Number of distinct days
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Flatten back into one sequence, newest day first
    pub fn into_records(self) -> Vec<R> {
        self.buckets.into_values().rev().flatten().collect()
    }
}

/// Calendar day of an instant in the given time zone
pub fn day_key<Tz: TimeZone>(date: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    date.with_timezone(tz).date_naive()
}

/// Group records by calendar day in the local time zone.
pub fn group_by_day<R: Record>(records: &[R]) -> DayGroups<R> {
    group_by_day_in(records, &Local)
}

/// Group records by calendar day in `tz`.
pub fn group_by_day_in<R: Record, Tz: TimeZone>(records: &[R], tz: &Tz) -> DayGroups<R> {
    let mut buckets: BTreeMap<NaiveDate, Vec<R>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(day_key(record.date(), tz))
            .or_default()
            .push(record.clone());
    }
    DayGroups { buckets }
}
