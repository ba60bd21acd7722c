use crate::{BucketHistogram, SUMMARY_QUANTILES};
use std::{collections::BTreeSet, sync::Arc};

/// Chooses, from a closed slot's histogram, the buckets that get sub-bucket resolution in the next slot.
pub type FocusSelector = Arc<dyn Fn(&BucketHistogram) -> BTreeSet<usize> + Send + Sync + 'static>;

/// Default focus selector. Focuses on the buckets that hold the quantiles reported by
/// [`Summary`](crate::Summary), i.e., the buckets from the median through the upper tail.
pub fn default_focus_selector(hist: &BucketHistogram) -> BTreeSet<usize> {
    buckets_at_quantiles(hist, &SUMMARY_QUANTILES)
}

/// Custom focus selector that focuses on the buckets holding the given `quantiles`.
pub fn focus_on_quantiles(
    quantiles: &[f64],
) -> impl Fn(&BucketHistogram) -> BTreeSet<usize> + Send + Sync + 'static {
    let quantiles = quantiles.to_vec();
    move |hist: &BucketHistogram| buckets_at_quantiles(hist, &quantiles)
}

fn buckets_at_quantiles(hist: &BucketHistogram, quantiles: &[f64]) -> BTreeSet<usize> {
    quantiles
        .iter()
        .filter_map(|p| hist.bucket_at_quantile(*p))
        .collect()
}
