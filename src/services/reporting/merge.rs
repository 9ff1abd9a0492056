use std::collections::HashMap;

use serde::Serialize;

use super::calendar::{BucketKey, BucketPlan, GroupingDimension};
use super::store::{AggregateRow, RawKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SeriesPoint {
    #[serde(flatten)]
    pub bucket: BucketKey,
    pub value: i64,
}

/// Dense series: exactly one point per canonical bucket, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    pub fn zeroed(keys: &[BucketKey]) -> Self {
        Self {
            points: keys
                .iter()
                .map(|bucket| SeriesPoint {
                    bucket: *bucket,
                    value: 0,
                })
                .collect(),
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, bucket: BucketKey) -> Option<i64> {
        self.points
            .iter()
            .find(|point| point.bucket == bucket)
            .map(|point| point.value)
    }

    /// Back to store-shaped rows, e.g. to re-merge a series.
    pub fn to_rows(&self) -> Vec<AggregateRow> {
        self.points
            .iter()
            .map(|point| AggregateRow::new(raw_key_for(point.bucket), Some(point.value)))
            .collect()
    }
}

pub fn bucket_for(dimension: GroupingDimension, raw: RawKey) -> Option<BucketKey> {
    match (dimension, raw) {
        (GroupingDimension::HourOfDay, RawKey::Integer(hour)) => {
            u32::try_from(hour).ok().map(BucketKey::Hour)
        }
        (GroupingDimension::MonthOfYear, RawKey::Integer(month)) => {
            u32::try_from(month).ok().map(BucketKey::MonthOfYear)
        }
        (GroupingDimension::CalendarDate, RawKey::Date(date)) => {
            Some(BucketKey::CalendarDate(date))
        }
        _ => None,
    }
}

fn raw_key_for(bucket: BucketKey) -> RawKey {
    match bucket {
        BucketKey::Hour(hour) => RawKey::Integer(i64::from(hour)),
        BucketKey::MonthOfYear(month) => RawKey::Integer(i64::from(month)),
        BucketKey::CalendarDate(date) => RawKey::Date(date),
    }
}

/// Lays `rows` over the plan's buckets. Missing buckets stay 0, null values
/// count as 0, and rows whose key is outside the plan are logged and dropped.
pub fn merge(plan: &BucketPlan, rows: &[AggregateRow]) -> Series {
    let mut series = Series::zeroed(&plan.keys);
    let index: HashMap<BucketKey, usize> = plan
        .keys
        .iter()
        .enumerate()
        .map(|(idx, key)| (*key, idx))
        .collect();

    for row in rows {
        let slot = bucket_for(plan.dimension, row.key).and_then(|key| index.get(&key));
        match slot {
            Some(&idx) => series.points[idx].value = row.value.unwrap_or(0),
            None => tracing::warn!(
                raw_key = ?row.key,
                dimension = ?plan.dimension,
                window_start = %plan.window.start(),
                window_end = %plan.window.end(),
                "aggregate row outside canonical buckets; dropped"
            ),
        }
    }

    series
}
