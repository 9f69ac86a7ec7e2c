//! Maximum value per drillhole and per downhole interval.
//!
//! Keys are the drillhole id, or the drillhole id and the bucket
//! `floor(depth_from / interval)`. The reported row is the one that
//! produced the maximum; the first such row in input order wins ties.
//! Rows without a value never contribute, so a key whose rows are all null
//! is absent from the output. Likewise, interval keys need a depth whose
//! bucket fits in an `i64`.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::info;

use geochem_model::{GeochemError, Record, Result};

use crate::order::IdKey;

/// Bucket index of `depth_from` for a positive `interval` in metres.
///
/// `None` when the depth is not finite or its bucket is out of range.
pub fn bucket_index(depth_from: f64, interval: i64) -> Option<i64> {
    let bucket = (depth_from / interval as f64).floor();
    (bucket.is_finite() && bucket >= i64::MIN as f64 && bucket < i64::MAX as f64)
        .then_some(bucket as i64)
}

/// One aggregated key and the row holding its maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxRow {
    pub drillhole_id: String,
    /// Interval bucket index, when aggregating by interval.
    pub bucket: Option<i64>,
    /// Interval size in metres, when aggregating by interval.
    pub interval: Option<i64>,
    pub record: Record,
}

impl MaxRow {
    pub fn value(&self) -> Option<f64> {
        self.record.value
    }

    /// Top of the bucket in metres, `None` on overflow.
    pub fn interval_from(&self) -> Option<i64> {
        let (bucket, size) = self.bucket.zip(self.interval)?;
        bucket.checked_mul(size)
    }

    /// Bottom of the bucket in metres, `None` on overflow.
    pub fn interval_to(&self) -> Option<i64> {
        let (bucket, size) = self.bucket.zip(self.interval)?;
        bucket.checked_add(1)?.checked_mul(size)
    }
}

/// Batch-wise running maximum per key.
#[derive(Debug, Clone)]
pub struct MaxAccumulator {
    interval: Option<i64>,
    best: BTreeMap<(IdKey, Option<i64>), Record>,
    seen: usize,
}

impl MaxAccumulator {
    pub fn per_hole() -> Self {
        Self {
            interval: None,
            best: BTreeMap::new(),
            seen: 0,
        }
    }

    /// Fails with `InvalidInterval` unless `interval` is positive.
    pub fn per_interval(interval: i64) -> Result<Self> {
        if interval <= 0 {
            return Err(GeochemError::InvalidInterval { interval });
        }
        Ok(Self {
            interval: Some(interval),
            ..Self::per_hole()
        })
    }

    pub fn push(&mut self, record: Record) {
        self.seen += 1;
        let (Some(drillhole), Some(value)) = (record.drillhole_id.as_deref(), record.value) else {
            return;
        };
        let bucket = match self.interval {
            Some(interval) => {
                let Some(bucket) = record
                    .depth_from
                    .and_then(|depth| bucket_index(depth, interval))
                else {
                    return;
                };
                Some(bucket)
            }
            None => None,
        };
        match self.best.entry((IdKey::new(drillhole), bucket)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().value.is_some_and(|best| value > best) {
                    slot.insert(record);
                }
            }
        }
    }

    pub fn push_batch(&mut self, batch: Vec<Record>) {
        for record in batch {
            self.push(record);
        }
    }

    /// Rows ordered by drillhole id, then bucket.
    pub fn finish(self) -> Vec<MaxRow> {
        let interval = self.interval;
        let rows: Vec<MaxRow> = self
            .best
            .into_iter()
            .map(|((drillhole, bucket), record)| MaxRow {
                drillhole_id: drillhole.into_string(),
                bucket,
                interval,
                record,
            })
            .collect();
        info!(
            rows_seen = self.seen,
            keys = rows.len(),
            interval = interval.unwrap_or(0),
            "aggregated downhole maxima"
        );
        rows
    }
}

/// Maximum value per drillhole.
pub fn max_per_hole(records: impl IntoIterator<Item = Record>) -> Vec<MaxRow> {
    let mut accumulator = MaxAccumulator::per_hole();
    records.into_iter().for_each(|record| accumulator.push(record));
    accumulator.finish()
}

/// Maximum value per drillhole and `interval_size` metre bucket.
pub fn max_per_interval(
    records: impl IntoIterator<Item = Record>,
    interval_size: i64,
) -> Result<Vec<MaxRow>> {
    let mut accumulator = MaxAccumulator::per_interval(interval_size)?;
    records.into_iter().for_each(|record| accumulator.push(record));
    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(hole: &str, sample: &str, value: Option<f64>, depth: f64) -> Record {
        Record::reading(sample, "Cu", value)
            .with_drillhole(hole)
            .with_depth(Some(depth), Some(depth + 2.0))
    }

    #[test]
    fn buckets_by_depth_from() {
        assert_eq!(bucket_index(12.0, 10), Some(1));
        assert_eq!(bucket_index(9.0, 10), Some(0));
        assert_eq!(bucket_index(10.0, 10), Some(1));
        assert_eq!(bucket_index(0.0, 10), Some(0));
        assert_eq!(bucket_index(-0.5, 10), Some(-1));
    }

    #[test]
    fn unrepresentable_depths_have_no_bucket() {
        assert_eq!(bucket_index(1e300, 10), None);
        assert_eq!(bucket_index(-1e300, 10), None);
        assert_eq!(bucket_index(f64::NAN, 10), None);
        assert_eq!(bucket_index(f64::INFINITY, 10), None);
    }

    #[test]
    fn huge_depths_do_not_overflow_bounds() {
        let rows = max_per_interval(
            [
                hole("DH1", "1", Some(1.0), 1e300),
                hole("DH1", "2", Some(2.0), f64::NAN),
                hole("DH1", "3", Some(3.0), 9.0e19),
                hole("DH2", "4", Some(4.0), 5.0),
            ],
            10,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.sample_id, "3");
        assert_eq!(rows[0].bucket, Some(9_000_000_000_000_000_000));
        assert_eq!(rows[0].interval_from(), None);
        assert_eq!(rows[0].interval_to(), None);
        assert_eq!(rows[1].interval_from(), Some(0));
        assert_eq!(rows[1].interval_to(), Some(10));
    }

    #[test]
    fn all_null_hole_is_dropped() {
        let rows = max_per_hole([
            hole("DH1", "1", Some(3.2), 0.0),
            hole("DH1", "2", None, 2.0),
            hole("DH1", "3", Some(7.8), 4.0),
            hole("DH2", "4", None, 0.0),
            hole("DH2", "5", None, 2.0),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].drillhole_id, "DH1");
        assert_eq!(rows[0].value(), Some(7.8));
        assert_eq!(rows[0].record.sample_id, "3");
    }

    #[test]
    fn ties_keep_first_row() {
        let rows = max_per_hole([hole("DH1", "1", Some(5.0), 0.0), hole("DH1", "2", Some(5.0), 2.0)]);
        assert_eq!(rows[0].record.sample_id, "1");
    }

    #[test]
    fn coordinates_come_from_max_row() {
        let rows = max_per_hole([
            hole("DH1", "1", Some(1.0), 0.0).with_location(136.0, -30.0),
            hole("DH1", "2", Some(9.0), 2.0).with_location(137.0, -31.0),
        ]);
        assert_eq!(rows[0].record.longitude, Some(137.0));
        assert_eq!(rows[0].record.latitude, Some(-31.0));
    }

    #[test]
    fn interval_keys_and_bounds() {
        let rows = max_per_interval(
            [
                hole("DH1", "1", Some(1.0), 9.0),
                hole("DH1", "2", Some(4.0), 12.0),
                hole("DH1", "3", Some(2.0), 18.0),
                Record::reading("4", "Cu", Some(100.0)).with_drillhole("DH1"),
            ],
            10,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].bucket, rows[0].value()), (Some(0), Some(1.0)));
        assert_eq!((rows[1].bucket, rows[1].value()), (Some(1), Some(4.0)));
        assert_eq!(rows[1].interval_from(), Some(10));
        assert_eq!(rows[1].interval_to(), Some(20));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        for interval in [0, -5] {
            let err = max_per_interval(Vec::new(), interval).unwrap_err();
            assert!(matches!(err, GeochemError::InvalidInterval { interval: i } if i == interval));
        }
    }

    #[test]
    fn surface_samples_are_ignored() {
        let rows = max_per_hole([Record::reading("1", "Cu", Some(5.0))]);
        assert!(rows.is_empty());
    }
}
