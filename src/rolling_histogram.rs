//! Main public interface of library.

use crate::{
    BucketHistogram, Clock, HistogramError, RollingWindow, RollingWindowCfg, Summary, SystemClock,
};

/// Rolling percentile estimator: a [`RollingWindow`] of [`BucketHistogram`]s behind the four operations
/// an embedding application needs.
///
/// Percentiles reflect roughly the last window of samples (60 seconds by default). Accuracy is refined at
/// every quantum rotation by giving sub-bucket resolution to the buckets that held the median and upper
/// percentiles during the previous quantum.
///
/// Reads take `&mut self` because they rotate and expire slots lazily.
pub struct RollingHistogram<C = SystemClock> {
    window: RollingWindow<C>,
}

impl Default for RollingHistogram {
    /// Instantiates a [`RollingHistogram`] with the default [`RollingWindowCfg`] and the system clock.
    fn default() -> Self {
        Self {
            window: RollingWindow::new(RollingWindowCfg::default(), SystemClock)
                .expect("default configuration is valid"),
        }
    }
}

impl RollingHistogram {
    /// Creates a [`RollingHistogram`] with the given configuration and the system clock.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidConfig`] if `cfg` is invalid.
    pub fn new(cfg: RollingWindowCfg) -> Result<Self, HistogramError> {
        Self::with_clock(cfg, SystemClock)
    }
}

impl<C: Clock> RollingHistogram<C> {
    /// Creates a [`RollingHistogram`] with the given configuration, reading time from `clock`.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidConfig`] if `cfg` is invalid.
    pub fn with_clock(cfg: RollingWindowCfg, clock: C) -> Result<Self, HistogramError> {
        Ok(Self {
            window: RollingWindow::new(cfg, clock)?,
        })
    }

    /// Records a sample.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidArgument`] if `value` is not a positive finite number.
    pub fn update(&mut self, value: f64) -> Result<(), HistogramError> {
        self.window.update(value)
    }

    /// Summary of the samples in the window.
    pub fn summary(&mut self) -> Summary {
        self.window.summary()
    }

    /// Merged histogram of the samples in the window, e.g. to combine several instances with
    /// [`BucketHistogram::add`].
    pub fn to_histogram(&mut self) -> BucketHistogram {
        self.window.merged()
    }

    /// Histogram of the quantum in progress, showing which buckets are currently focused.
    pub fn current(&mut self) -> &BucketHistogram {
        self.window.current()
    }

    /// See [`BucketHistogramCfg::bucket_bounds`](crate::BucketHistogramCfg::bucket_bounds).
    pub fn bucket_bounds(&self, bucket_index: usize) -> (u64, u64) {
        self.window.cfg().histogram_cfg().bucket_bounds(bucket_index)
    }
}
