//! Streams samples from different models over five quanta and compares the rolling summary against exact
//! percentiles of the samples still in the window.

mod common;

use common::{
    clustered_model, gaussian_model, linear_model, manual_histogram, secs, small_model, spiky_model,
};
use rand::{rngs::StdRng, SeedableRng};
use rolling_histogram::{BucketHistogramCfg, Summary};

const SAMPLES_PER_QUANTUM: usize = 10_000;

fn end_to_end(
    model: fn(&mut StdRng) -> f64,
    hist_cfg: BucketHistogramCfg,
    accuracy_pct: f64,
    accuracy_fixed: f64,
) {
    let mut rng = StdRng::seed_from_u64(42);
    let (clock, mut hist) = manual_histogram(hist_cfg);

    // The first quantum has expired by the time of the read.
    for _ in 0..SAMPLES_PER_QUANTUM {
        hist.update(model(&mut rng)).unwrap();
    }

    let mut values = Vec::with_capacity(4 * SAMPLES_PER_QUANTUM);
    for at in [16, 31, 46, 61] {
        clock.set(secs(at));
        for _ in 0..SAMPLES_PER_QUANTUM {
            let value = model(&mut rng);
            hist.update(value).unwrap();
            values.push(value);
        }
    }

    clock.set(secs(76));

    values.sort_by(f64::total_cmp);
    let exact = |p: f64| values[(values.len() as f64 * p).round() as usize];
    let summary = hist.summary();

    assert_eq!(summary.count, values.len() as u64);
    assert_eq!(summary.min, values.first().copied());
    assert_eq!(summary.max, values.last().copied());

    let Summary {
        median,
        p75,
        p95,
        p99,
        p999,
        ..
    } = summary;
    let low = 1.0 - accuracy_pct;
    let high = 1.0 + accuracy_pct;
    for (name, estimate, p) in [
        ("median", median, 0.5),
        ("p75", p75, 0.75),
        ("p95", p95, 0.95),
        ("p99", p99, 0.99),
        ("p999", p999, 0.999),
    ] {
        let expected = exact(p);
        let estimate = estimate.unwrap();
        assert!(
            expected * low - accuracy_fixed <= estimate && estimate <= expected * high + accuracy_fixed,
            "{name}: estimate={estimate}, exact={expected}"
        );
    }
}

// Five buckets and five sub-buckets per decade give a resolution of 10^(1/25) ~ 1.1, i.e., +-5%.

#[test]
fn gaussian_model_within_five_percent() {
    end_to_end(gaussian_model, BucketHistogramCfg::default(), 0.05, 0.0);
}

#[test]
fn linear_model_within_five_percent() {
    end_to_end(linear_model, BucketHistogramCfg::default(), 0.05, 0.0);
}

#[test]
fn clustered_model_within_five_percent() {
    end_to_end(clustered_model, BucketHistogramCfg::default(), 0.05, 0.0);
}

#[test]
fn spiky_model_within_five_percent() {
    end_to_end(spiky_model, BucketHistogramCfg::default(), 0.05, 0.0);
}

// Ten and ten give 10^(1/100) ~ 1.023.
#[test]
fn gaussian_model_within_one_and_a_quarter_percent_with_finer_scales() {
    let cfg = BucketHistogramCfg::default()
        .with_main_scale(10)
        .with_sub_scale(10);
    end_to_end(gaussian_model, cfg, 0.0125, 0.0);
}

// Below `min_value` everything lands in bucket 0, whose five sub-buckets are 0.2 wide.
#[test]
fn values_below_min_value_within_fixed_accuracy() {
    let cfg = BucketHistogramCfg::default().with_min_value(1.0);
    end_to_end(small_model, cfg, 0.0, 0.2);
}
