use crate::BucketHistogramCfg;
use std::{error::Error, fmt::Display};

//==============
// Errors

/// Error returned by histogram construction, [`update`](crate::BucketHistogram::update) and
/// [`add`](crate::BucketHistogram::add).
///
/// A failed operation never modifies the histogram it was called on.
#[derive(Debug, Clone, PartialEq)]
pub enum HistogramError {
    /// A sample that is not a positive finite number was passed to `update`.
    InvalidArgument { value: f64 },
    /// Two histograms with different bucket configurations were merged.
    ConfigMismatch {
        left: BucketHistogramCfg,
        right: BucketHistogramCfg,
    },
    /// A configuration parameter is out of its valid range.
    InvalidConfig(&'static str),
}

impl Display for HistogramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { value } => write!(
                f,
                "histogram update supports only positive numbers but got [{value}]"
            ),
            Self::ConfigMismatch { left, right } => write!(
                f,
                "incompatible histogram configs ({left:?} and {right:?})"
            ),
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl Error for HistogramError {}
