#![allow(dead_code)]

use rand::Rng;
use rolling_histogram::{
    BucketHistogramCfg, ManualClock, RollingHistogram, RollingWindowCfg, Summary,
};
use std::{rc::Rc, time::Duration};

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// A [`RollingHistogram`] driven by a [`ManualClock`] set to zero.
pub fn manual_histogram(
    hist_cfg: BucketHistogramCfg,
) -> (Rc<ManualClock>, RollingHistogram<Rc<ManualClock>>) {
    _ = env_logger::try_init();
    let clock = Rc::new(ManualClock::new());
    let cfg = RollingWindowCfg::default().with_histogram_cfg(hist_cfg);
    let hist = RollingHistogram::with_clock(cfg, clock.clone()).unwrap();
    (clock, hist)
}

pub fn are_close(left: f64, right: f64, pct: f64) -> bool {
    let avg_abs = (left.abs() + right.abs()) / 2.0;
    (left - right).abs() <= avg_abs * pct
}

pub fn within(value: Option<f64>, low: f64, high: f64) -> bool {
    value.map_or(false, |v| low <= v && v <= high)
}

/// Expected percentile ranges, in [`Summary`] field order from `median` through `p999`.
pub struct PercentileRanges(pub [(f64, f64); 5]);

pub fn assert_percentiles(summary: &Summary, ranges: &PercentileRanges) {
    let actual = [
        ("median", summary.median),
        ("p75", summary.p75),
        ("p95", summary.p95),
        ("p99", summary.p99),
        ("p999", summary.p999),
    ];
    for ((name, value), (low, high)) in actual.into_iter().zip(ranges.0) {
        assert!(
            within(value, low, high),
            "{name}={value:?} not in [{low}, {high}]; summary={summary:?}"
        );
    }
}

//=================
// Sample models

/// Approximately gaussian in `[0, 1)`, centered on `0.5`.
pub fn normal_rand(rng: &mut impl Rng) -> f64 {
    (0..10).map(|_| rng.gen::<f64>()).sum::<f64>() / 10.0
}

/// Gaussian around 510.
pub fn gaussian_model(rng: &mut impl Rng) -> f64 {
    normal_rand(rng) * 1000.0 + 10.0
}

/// Uniform in `[10, 1010)`.
pub fn linear_model(rng: &mut impl Rng) -> f64 {
    rng.gen::<f64>() * 1000.0 + 10.0
}

/// Clusters: median and p75 in `[40, 50]`, p95 in `[60, 70]`, p99 in `[70, 80]`, p999 in `[80, 90]`.
pub fn clustered_model(rng: &mut impl Rng) -> f64 {
    let group = rng.gen::<f64>() * 200.0;
    if group < 92.0 * 2.0 {
        40.0 + normal_rand(rng) * 10.0
    } else if group < (92.0 + 6.0) * 2.0 {
        60.0 + normal_rand(rng) * 10.0
    } else if group < (92.0 + 6.0 + 1.5) * 2.0 {
        70.0 + normal_rand(rng) * 10.0
    } else {
        80.0 + normal_rand(rng) * 10.0
    }
}

/// Gaussian with a small spike for 20% of the samples and a large one for 3%.
pub fn spiky_model(rng: &mut impl Rng) -> f64 {
    let mut value = normal_rand(rng) * 1000.0 + 10.0;
    if rng.gen::<f64>() > 0.8 {
        value += normal_rand(rng) * 10_000.0;
    }
    if rng.gen::<f64>() > 0.97 {
        value += normal_rand(rng) * 100_000.0;
    }
    value
}

/// Gaussian in `[0, 0.1)`.
pub fn small_model(rng: &mut impl Rng) -> f64 {
    normal_rand(rng) / 10.0
}
