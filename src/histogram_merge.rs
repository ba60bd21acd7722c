//! Pure merge of two [`BucketHistogram`]s.

use crate::{
    bucket_histogram::{fold_max, fold_min, Bucket, BucketStats},
    BucketHistogram, HistogramError,
};
use std::{cmp::Reverse, collections::BTreeMap};

type SubBuckets = BTreeMap<usize, BucketStats>;

impl BucketHistogram {
    /// Returns a new histogram holding the samples of both `self` and `other`. Neither operand is modified.
    ///
    /// The result has `self`'s configuration and the union of both operands' focus buckets. When a bucket
    /// has sub-buckets on only one side, the other side's count is spread across those sub-buckets in
    /// proportion to their counts, keeping the bucket total exact.
    ///
    /// # Errors
    /// - [`HistogramError::ConfigMismatch`] if the operands' configurations differ.
    pub fn add(&self, other: &BucketHistogram) -> Result<BucketHistogram, HistogramError> {
        if self.cfg != other.cfg {
            return Err(HistogramError::ConfigMismatch {
                left: self.cfg,
                right: other.cfg,
            });
        }
        Ok(self.merged(other))
    }

    /// Merge that assumes equal configurations.
    pub(crate) fn merged(&self, other: &BucketHistogram) -> BucketHistogram {
        log::trace!("entering `merged`");
        let focus_buckets = self
            .focus_buckets
            .union(&other.focus_buckets)
            .copied()
            .collect();
        let mut result = BucketHistogram::from_parts(self.cfg, focus_buckets);
        result.min = fold_min(self.min, other.min);
        result.max = fold_max(self.max, other.max);
        result.count = self.count + other.count;

        let mut buckets = self.buckets.clone();
        for (idx, theirs) in &other.buckets {
            let merged = match buckets.get(idx) {
                Some(ours) => merge_buckets(ours, theirs),
                None => theirs.clone(),
            };
            buckets.insert(*idx, merged);
        }
        result.buckets = buckets;

        result
    }
}

fn merge_buckets(ours: &Bucket, theirs: &Bucket) -> Bucket {
    let stats = ours.stats.combine(&theirs.stats);
    let sub_buckets = match (&ours.sub_buckets, &theirs.sub_buckets) {
        (Some(a), Some(b)) => Some(merge_sub_buckets(a, b)),
        (Some(a), None) => Some(redistribute(a, ours.stats.count, theirs.stats.count)),
        (None, Some(b)) => Some(redistribute(b, theirs.stats.count, ours.stats.count)),
        (None, None) => None,
    };
    Bucket { stats, sub_buckets }
}

fn merge_sub_buckets(a: &SubBuckets, b: &SubBuckets) -> SubBuckets {
    let mut merged = a.clone();
    for (idx, stats) in b {
        merged
            .entry(*idx)
            .and_modify(|s| *s = s.combine(stats))
            .or_insert(*stats);
    }
    merged
}

/// Spreads `other_count` samples that carry no sub-bucket information across a copy of `source`, the
/// sub-buckets of a bucket holding `source_count` samples.
///
/// Every sub-bucket count is scaled by `1 + other_count / source_count` and floored. The units lost to
/// flooring are then handed out one at a time to the largest sub-buckets (ties by ascending index), so the
/// resulting counts sum to exactly `source_count + other_count`. Flooring loses less than one unit per
/// sub-bucket, so one pass normally suffices.
pub(crate) fn redistribute(source: &SubBuckets, source_count: u64, other_count: u64) -> SubBuckets {
    let mut subs = source.clone();
    if subs.is_empty() {
        return subs;
    }
    let total = source_count + other_count;
    let ratio = if source_count == 0 {
        1.0
    } else {
        1.0 + other_count as f64 / source_count as f64
    };
    for stats in subs.values_mut() {
        stats.count = (stats.count as f64 * ratio).floor() as u64;
    }

    let mut remainder = total.saturating_sub(subs.values().map(|s| s.count).sum::<u64>());
    while remainder > 0 {
        let mut order: Vec<(usize, u64)> = subs.iter().map(|(k, s)| (*k, s.count)).collect();
        order.sort_by_key(|(_, count)| Reverse(*count));
        for (idx, _) in order.into_iter().take(remainder as usize) {
            if let Some(stats) = subs.get_mut(&idx) {
                stats.count += 1;
                remainder -= 1;
            }
        }
    }
    subs
}
