//! Percentile interpolation and the [`Summary`] record.

use crate::{bucket_histogram::BucketStats, BucketHistogram};
use serde::Serialize;

/// Quantiles reported by [`Summary`], in field order.
pub const SUMMARY_QUANTILES: [f64; 5] = [0.5, 0.75, 0.95, 0.99, 0.999];

/// Summary statistics of a [`BucketHistogram`].
///
/// An empty histogram yields a summary whose only present field is `count` (equal to `0`). Serialized,
/// absent fields are omitted, so an empty summary renders as `{"count":0}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p75: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p999: Option<f64>,
    /// Number of buckets plus the sub-bucket span of every focus bucket; an indicator of resolution,
    /// not of sample count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_buckets: Option<usize>,
}

/// Position of the cell where a cumulative walk crosses a quantile.
struct Crossing<'a> {
    bucket_index: usize,
    cell: &'a BucketStats,
    count_before: u64,
}

impl BucketHistogram {
    /// Cells in ascending value order: the sub-buckets of buckets that have them, the bucket itself
    /// otherwise.
    fn cells(&self) -> impl Iterator<Item = (usize, &BucketStats)> + '_ {
        self.buckets.iter().flat_map(|(idx, bucket)| {
            let subs = bucket.sub_buckets.as_ref();
            let whole = subs.is_none().then_some(&bucket.stats);
            subs.into_iter()
                .flat_map(|subs| subs.values())
                .chain(whole)
                .map(move |cell| (*idx, cell))
        })
    }

    /// Walks the cells accumulating counts until `cumulative / samples_count >= p`. Falls back to the last
    /// cell if the walk never crosses `p`. Returns `None` if there are no cells.
    fn crossing(&self, p: f64, samples_count: u64) -> Option<Crossing<'_>> {
        let n = samples_count as f64;
        let mut cumulative = 0;
        let mut last = None;
        for (bucket_index, cell) in self.cells() {
            let count_before = cumulative;
            cumulative += cell.count;
            last = Some(Crossing {
                bucket_index,
                cell,
                count_before,
            });
            if cumulative as f64 / n >= p {
                break;
            }
        }
        last
    }

    fn percentile_of(&self, p: f64, samples_count: u64) -> Option<f64> {
        let Crossing {
            cell, count_before, ..
        } = self.crossing(p, samples_count)?;
        let fraction = (samples_count as f64 * p - count_before as f64) / cell.count as f64;
        Some(cell.min + fraction * (cell.max - cell.min))
    }

    /// Estimated value at quantile `p`, interpolated linearly between the min and max of the cell where
    /// the cumulative count crosses `p`.
    ///
    /// Returns `None` if the histogram is empty. `p` is expected to be in `(0, 1)`.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        let samples_count = self.samples_count();
        if samples_count == 0 {
            return None;
        }
        self.percentile_of(p, samples_count)
    }

    /// Index of the bucket holding quantile `p`, `None` if the histogram is empty.
    pub fn bucket_at_quantile(&self, p: f64) -> Option<usize> {
        let samples_count = self.samples_count();
        if samples_count == 0 {
            return None;
        }
        self.crossing(p, samples_count).map(|c| c.bucket_index)
    }

    /// Number of buckets plus, for each bucket with sub-buckets, its highest sub-bucket index + 1.
    pub fn num_buckets(&self) -> usize {
        self.buckets
            .values()
            .map(|b| {
                let span = b
                    .sub_buckets
                    .as_ref()
                    .and_then(|subs| subs.keys().next_back())
                    .map_or(0, |last| last + 1);
                1 + span
            })
            .sum()
    }

    /// Computes the [`Summary`] of `self`.
    pub fn summary(&self) -> Summary {
        let samples_count = self.samples_count();
        if samples_count == 0 {
            return Summary::default();
        }
        let [median, p75, p95, p99, p999] =
            SUMMARY_QUANTILES.map(|p| self.percentile_of(p, samples_count));
        Summary {
            min: self.min,
            max: self.max,
            count: self.count,
            median,
            p75,
            p95,
            p99,
            p999,
            num_buckets: Some(self.num_buckets()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{BucketHistogram, BucketHistogramCfg, Summary};

    #[test]
    fn empty_summary_has_only_count() {
        let hist = BucketHistogram::default();
        let summary = hist.summary();
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.count, 0);
        assert_eq!(hist.percentile(0.5), None);
        assert_eq!(hist.bucket_at_quantile(0.5), None);
    }

    #[test]
    fn single_cell_interpolation() {
        let cfg = BucketHistogramCfg::default().with_min_value(1.0);
        let mut hist = BucketHistogram::new(cfg).unwrap();
        // All in bucket 9, [39.8, 63.1).
        for v in [40.0, 50.0, 60.0, 60.0] {
            hist.update(v).unwrap();
        }
        assert_eq!(hist.percentile(0.5), Some(50.0));
        assert_eq!(hist.percentile(0.75), Some(55.0));
        assert_eq!(hist.bucket_at_quantile(0.99), Some(9));
    }

    #[test]
    fn num_buckets_counts_sub_bucket_span() {
        let cfg = BucketHistogramCfg::default().with_min_value(1.0);
        let mut hist = BucketHistogram::new(cfg).unwrap().with_focus_buckets([9]);
        for v in [5.0, 40.0, 62.0, 80.0] {
            hist.update(v).unwrap();
        }
        // Buckets 4, 9 and 10; bucket 9 has sub-buckets 0 and 5.
        assert_eq!(hist.num_buckets(), 3 + 6);
        assert_eq!(hist.summary().num_buckets, Some(9));
    }

    #[test]
    fn percentiles_of_uniform_sequence() {
        let mut hist = BucketHistogram::default();
        for v in 1..=100 {
            hist.update(v as f64).unwrap();
        }
        let summary = hist.summary();
        assert_eq!(summary.count, 100);
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, Some(100.0));
        let within = |v: Option<f64>, lo: f64, hi: f64| v.map_or(false, |v| lo <= v && v <= hi);
        assert!(within(summary.median, 49.0, 51.0), "{summary:?}");
        assert!(within(summary.p75, 74.0, 76.0), "{summary:?}");
        assert!(within(summary.p95, 94.0, 96.0), "{summary:?}");
        assert!(within(summary.p99, 98.0, 100.0), "{summary:?}");
        assert!(within(summary.p999, 99.0, 100.0), "{summary:?}");
    }
}
