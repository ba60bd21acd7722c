//! Logarithmic bucket histogram with optional sub-bucket resolution for selected buckets.

use crate::HistogramError;
use std::collections::{BTreeMap, BTreeSet};

//=================
// BucketHistogramCfg

/// Bucket layout of a [`BucketHistogram`]. Only histograms with equal configurations can be merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketHistogramCfg {
    pub(crate) min_value: f64,
    pub(crate) main_scale: u32,
    pub(crate) sub_scale: u32,
}

impl Default for BucketHistogramCfg {
    /// The defaults are:
    /// - `min_value` of `0.01`; every sample below it falls into bucket `0`.
    /// - `main_scale` of `5`, i.e., five buckets per decade.
    /// - `sub_scale` of `5`, i.e., each focus bucket is split into five sub-buckets.
    fn default() -> Self {
        Self {
            min_value: 0.01,
            main_scale: 5,
            sub_scale: 5,
        }
    }
}

impl BucketHistogramCfg {
    /// Creates a new configuration the same as `self` but with the given `min_value`.
    pub fn with_min_value(&self, min_value: f64) -> Self {
        Self { min_value, ..*self }
    }

    /// Creates a new configuration the same as `self` but with the given `main_scale`.
    pub fn with_main_scale(&self, main_scale: u32) -> Self {
        Self {
            main_scale,
            ..*self
        }
    }

    /// Creates a new configuration the same as `self` but with the given `sub_scale`.
    pub fn with_sub_scale(&self, sub_scale: u32) -> Self {
        Self { sub_scale, ..*self }
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn main_scale(&self) -> u32 {
        self.main_scale
    }

    pub fn sub_scale(&self) -> u32 {
        self.sub_scale
    }

    /// Checks that `min_value` is a positive finite number and that both scales are non-zero.
    pub(crate) fn validate(&self) -> Result<(), HistogramError> {
        if !(self.min_value > 0.0 && self.min_value.is_finite()) {
            return Err(HistogramError::InvalidConfig(
                "min_value must be a positive finite number",
            ));
        }
        if self.main_scale == 0 {
            return Err(HistogramError::InvalidConfig("main_scale must be positive"));
        }
        if self.sub_scale == 0 {
            return Err(HistogramError::InvalidConfig("sub_scale must be positive"));
        }
        Ok(())
    }

    /// Index of the bucket that holds `value`.
    ///
    /// Non-decreasing in `value`. Bucket `0` holds every value below `min_value`.
    pub fn value_to_bucket(&self, value: f64) -> usize {
        let raw = (self.main_scale as f64 * (value.log10() - self.min_value.log10())).floor() + 1.0;
        to_index(raw)
    }

    /// Index of the sub-bucket that holds `value` within bucket `bucket_index`.
    ///
    /// The index is only meaningful relative to its parent bucket.
    pub fn value_to_sub_bucket(&self, bucket_index: usize, value: f64) -> usize {
        if bucket_index == 0 {
            return to_index((value / self.min_value * self.sub_scale as f64).floor());
        }
        let min_log = self.min_value.log10();
        let exp = (bucket_index - 1) as f64 / self.main_scale as f64 + min_log;
        let lower_bound = self.min_value * (10f64.powf(exp) / self.min_value).floor();
        to_index(
            (self.main_scale as f64 * (value.log10() - lower_bound.log10()) * self.sub_scale as f64)
                .floor(),
        )
    }

    /// Returns `(floor(10^((i-1)/main_scale)), floor(10^(i/main_scale)))`.
    ///
    /// These bounds are not rescaled by `min_value`, so they match the values actually held by bucket `i`
    /// only when `min_value` is `1`.
    pub fn bucket_bounds(&self, bucket_index: usize) -> (u64, u64) {
        let scale = self.main_scale as f64;
        let i = bucket_index as f64;
        (
            10f64.powf((i - 1.0) / scale).floor() as u64,
            10f64.powf(i / scale).floor() as u64,
        )
    }
}

/// Converts a floored index to `usize`, mapping negative values to `0`.
fn to_index(raw: f64) -> usize {
    if raw > 0.0 {
        raw as usize
    } else {
        0
    }
}

//=================
// Extrema folding

/// Minimum of two optional values where `None` means "no value yet".
pub(crate) fn fold_min(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Maximum of two optional values where `None` means "no value yet".
pub(crate) fn fold_max(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

//=================
// Buckets

/// Count and extrema of the samples that fell into a bucket or sub-bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketStats {
    pub(crate) count: u64,
    pub(crate) min: f64,
    pub(crate) max: f64,
}

impl BucketStats {
    fn first(value: f64) -> Self {
        Self {
            count: 1,
            min: value,
            max: value,
        }
    }

    fn record(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Stats of the union of the samples behind `self` and `other`.
    pub(crate) fn combine(&self, other: &Self) -> Self {
        Self {
            count: self.count + other.count,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// A bucket of a [`BucketHistogram`]. Focus buckets additionally hold sub-buckets keyed by their
/// sub-bucket index.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub(crate) stats: BucketStats,
    pub(crate) sub_buckets: Option<BTreeMap<usize, BucketStats>>,
}

impl Bucket {
    pub fn stats(&self) -> &BucketStats {
        &self.stats
    }

    pub fn count(&self) -> u64 {
        self.stats.count
    }

    pub fn sub_buckets(&self) -> Option<&BTreeMap<usize, BucketStats>> {
        self.sub_buckets.as_ref()
    }
}

//=================
// BucketHistogram

/// Histogram of positive samples bucketed on a logarithmic scale.
///
/// Buckets whose index is in [`focus_buckets`](Self::focus_buckets) are further split into sub-buckets,
/// which improves the accuracy of percentiles that fall into them. Buckets are created lazily and stored
/// sparsely: an absent index means no samples.
///
/// [`update`](Self::update) mutates the histogram in place while [`add`](Self::add) leaves both operands
/// untouched and returns a new histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketHistogram {
    pub(crate) cfg: BucketHistogramCfg,
    pub(crate) focus_buckets: BTreeSet<usize>,
    pub(crate) buckets: BTreeMap<usize, Bucket>,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) count: u64,
}

impl Default for BucketHistogram {
    /// Empty histogram with the default [`BucketHistogramCfg`] and no focus buckets.
    fn default() -> Self {
        Self::from_parts(BucketHistogramCfg::default(), BTreeSet::new())
    }
}

impl BucketHistogram {
    /// Creates an empty histogram with the given configuration and no focus buckets.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidConfig`] if `min_value` is not positive or a scale is zero.
    pub fn new(cfg: BucketHistogramCfg) -> Result<Self, HistogramError> {
        cfg.validate()?;
        Ok(Self::from_parts(cfg, BTreeSet::new()))
    }

    /// Creates a new empty histogram configured the same as `self` but with the given focus buckets.
    pub fn with_focus_buckets(&self, focus_buckets: impl IntoIterator<Item = usize>) -> Self {
        Self::from_parts(self.cfg, focus_buckets.into_iter().collect())
    }

    /// Assumes `cfg` has been validated.
    pub(crate) fn from_parts(cfg: BucketHistogramCfg, focus_buckets: BTreeSet<usize>) -> Self {
        Self {
            cfg,
            focus_buckets,
            buckets: BTreeMap::new(),
            min: None,
            max: None,
            count: 0,
        }
    }

    /// Records `value`.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidArgument`] if `value` is not a positive finite number. The histogram is
    ///   left unchanged in that case.
    pub fn update(&mut self, value: f64) -> Result<(), HistogramError> {
        if !(value > 0.0 && value.is_finite()) {
            return Err(HistogramError::InvalidArgument { value });
        }

        let idx = self.cfg.value_to_bucket(value);
        let focused = self.focus_buckets.contains(&idx);
        let sub_idx = focused.then(|| self.cfg.value_to_sub_bucket(idx, value));

        let bucket = self
            .buckets
            .entry(idx)
            .and_modify(|b| b.stats.record(value))
            .or_insert_with(|| Bucket {
                stats: BucketStats::first(value),
                sub_buckets: None,
            });

        if let Some(sub_idx) = sub_idx {
            bucket
                .sub_buckets
                .get_or_insert_with(BTreeMap::new)
                .entry(sub_idx)
                .and_modify(|s| s.record(value))
                .or_insert_with(|| BucketStats::first(value));
        }

        self.min = fold_min(self.min, Some(value));
        self.max = fold_max(self.max, Some(value));
        self.count += 1;
        Ok(())
    }

    pub fn cfg(&self) -> &BucketHistogramCfg {
        &self.cfg
    }

    /// Bucket indices that get sub-bucket resolution.
    pub fn focus_buckets(&self) -> &BTreeSet<usize> {
        &self.focus_buckets
    }

    /// Populated buckets by index.
    pub fn buckets(&self) -> &BTreeMap<usize, Bucket> {
        &self.buckets
    }

    /// Number of recorded samples.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest recorded sample, `None` if there is none.
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Largest recorded sample, `None` if there is none.
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// See [`BucketHistogramCfg::bucket_bounds`].
    pub fn bucket_bounds(&self, bucket_index: usize) -> (u64, u64) {
        self.cfg.bucket_bounds(bucket_index)
    }

    /// Sum of the bucket counts. Equal to [`count`](Self::count) unless counts were merged in from
    /// histograms built elsewhere.
    pub(crate) fn samples_count(&self) -> u64 {
        self.buckets.values().map(|b| b.stats.count).sum()
    }
}
