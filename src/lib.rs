//! This library estimates percentiles of a stream of positive samples (e.g., latencies) over a rolling time
//! window, using bounded memory.
//!
//! Samples are counted in buckets on a logarithmic scale ([`BucketHistogram`]) instead of being stored.
//! Selected *focus* buckets are split further into sub-buckets, and a [`RollingWindow`] re-selects the
//! focus buckets every quantum so that resolution follows the median and the upper percentiles.
//!
//! [`RollingHistogram`] is the main entry point.
//!
//! ```rust
//! use rolling_histogram::RollingHistogram;
//!
//! let mut hist = RollingHistogram::default();
//! for latency in [12.0, 15.5, 9.8, 120.0] {
//!     hist.update(latency).unwrap();
//! }
//! let summary = hist.summary();
//! assert_eq!(summary.count, 4);
//! assert!(summary.p99.is_some());
//! ```
//!
//! The data structures are single-threaded; callers that share an instance need their own mutual
//! exclusion, or can keep one instance per thread and combine them with [`BucketHistogram::add`].
#![deny(clippy::unwrap_used)]

mod bucket_histogram;
pub use bucket_histogram::{Bucket, BucketHistogram, BucketHistogramCfg, BucketStats};

mod histogram_merge;

mod summary;
pub use summary::*;

mod error;
pub use error::*;

mod focus;
pub use focus::*;

mod clock;
pub use clock::*;

mod rolling_window;
pub use rolling_window::*;

mod rolling_histogram;
pub use rolling_histogram::*;
