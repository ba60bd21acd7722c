//! Time-decayed composition of [`BucketHistogram`] slots.

use crate::{
    default_focus_selector, BucketHistogram, BucketHistogramCfg, Clock, FocusSelector,
    HistogramError, Summary, SystemClock,
};
use std::{
    collections::{BTreeSet, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

//=================
// RollingWindowCfg

/// Configuration of a [`RollingWindow`].
#[derive(Clone)]
pub struct RollingWindowCfg {
    pub(crate) window: Duration,
    pub(crate) quantum: Duration,
    pub(crate) histogram_cfg: BucketHistogramCfg,
    pub(crate) focus_selector: FocusSelector,
}

impl Default for RollingWindowCfg {
    /// The defaults are:
    /// - `window` of 60 seconds. Data is retained for the window plus one quantum of grace, so samples are
    ///   fully gone 75 seconds after the start of the quantum they were recorded in.
    /// - `quantum` of 15 seconds, i.e., four quanta per window.
    /// - the default [`BucketHistogramCfg`].
    /// - the [`default_focus_selector`].
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            quantum: Duration::from_secs(15),
            histogram_cfg: BucketHistogramCfg::default(),
            focus_selector: Arc::new(default_focus_selector),
        }
    }
}

impl RollingWindowCfg {
    /// Creates a new configuration the same as `self` but with the given `window`.
    pub fn with_window(&self, window: Duration) -> Self {
        Self {
            window,
            ..self.clone()
        }
    }

    /// Creates a new configuration the same as `self` but with the given `quantum`.
    pub fn with_quantum(&self, quantum: Duration) -> Self {
        Self {
            quantum,
            ..self.clone()
        }
    }

    /// Creates a new configuration the same as `self` but with the given `histogram_cfg`.
    pub fn with_histogram_cfg(&self, histogram_cfg: BucketHistogramCfg) -> Self {
        Self {
            histogram_cfg,
            ..self.clone()
        }
    }

    /// Creates a new configuration the same as `self` but with the given `focus_selector`.
    pub fn with_focus_selector(
        &self,
        focus_selector: impl Fn(&BucketHistogram) -> BTreeSet<usize> + Send + Sync + 'static,
    ) -> Self {
        Self {
            focus_selector: Arc::new(focus_selector),
            ..self.clone()
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn quantum(&self) -> Duration {
        self.quantum
    }

    pub fn histogram_cfg(&self) -> &BucketHistogramCfg {
        &self.histogram_cfg
    }

    /// Age past which a slot is evicted.
    fn retention(&self) -> Duration {
        self.window + self.quantum
    }

    fn validate(&self) -> Result<(), HistogramError> {
        self.histogram_cfg.validate()?;
        if self.quantum.is_zero() {
            return Err(HistogramError::InvalidConfig("quantum must be positive"));
        }
        if self.window < self.quantum {
            return Err(HistogramError::InvalidConfig(
                "window must be at least one quantum",
            ));
        }
        Ok(())
    }
}

//=================
// Slot

/// A histogram anchored at the start of its quantum.
#[derive(Debug, Clone)]
struct Slot {
    histogram: BucketHistogram,
    opened_at: Instant,
}

//=================
// RollingWindow

/// Sequence of time-anchored histogram slots, oldest first, of which the newest is open for updates.
///
/// There are no timers: every access first evaluates, against the clock's current instant,
/// - rotation: once the open slot's quantum has elapsed, it is closed and a new slot is opened at the latest
///   quantum boundary, with focus buckets chosen by the [`FocusSelector`] from the just-closed slot;
/// - expiry: slots older than window + quantum are dropped.
///
/// Reads merge all remaining slots.
pub struct RollingWindow<C = SystemClock> {
    cfg: RollingWindowCfg,
    clock: C,
    slots: VecDeque<Slot>,
}

impl<C: Clock> RollingWindow<C> {
    /// Creates a window whose first slot opens at the clock's current instant.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidConfig`] if the histogram configuration is invalid, `quantum` is zero or
    ///   `window` is shorter than `quantum`.
    pub fn new(cfg: RollingWindowCfg, clock: C) -> Result<Self, HistogramError> {
        cfg.validate()?;
        let first = Slot {
            histogram: BucketHistogram::from_parts(cfg.histogram_cfg, BTreeSet::new()),
            opened_at: clock.now(),
        };
        Ok(Self {
            cfg,
            clock,
            slots: VecDeque::from([first]),
        })
    }

    pub fn cfg(&self) -> &RollingWindowCfg {
        &self.cfg
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Records `value` in the open slot.
    ///
    /// # Errors
    /// - [`HistogramError::InvalidArgument`] if `value` is not a positive finite number.
    pub fn update(&mut self, value: f64) -> Result<(), HistogramError> {
        self.maintain();
        self.open_slot_mut().histogram.update(value)
    }

    /// Histogram of the open slot, not merged with history.
    pub fn current(&mut self) -> &BucketHistogram {
        self.maintain();
        &self.open_slot().histogram
    }

    /// Merge of all slots that have not expired.
    pub fn merged(&mut self) -> BucketHistogram {
        self.maintain();
        log::trace!("merging {} slots", self.slots.len());
        let mut slots = self.slots.iter();
        let first = slots
            .next()
            .map(|s| s.histogram.clone())
            .expect("window always holds an open slot");
        slots.fold(first, |acc, s| acc.merged(&s.histogram))
    }

    /// [`Summary`] of the merge of all slots that have not expired.
    pub fn summary(&mut self) -> Summary {
        self.merged().summary()
    }

    /// Number of slots that have not expired, the open slot included.
    pub fn slot_count(&mut self) -> usize {
        self.maintain();
        self.slots.len()
    }

    fn open_slot(&self) -> &Slot {
        self.slots
            .back()
            .expect("window always holds an open slot")
    }

    fn open_slot_mut(&mut self) -> &mut Slot {
        self.slots
            .back_mut()
            .expect("window always holds an open slot")
    }

    /// Rotation and expiry at the clock's current instant.
    fn maintain(&mut self) {
        let now = self.clock.now();
        self.rotate(now);
        self.expire(now);
    }

    fn rotate(&mut self, now: Instant) {
        let open = self.open_slot();
        let elapsed = now.saturating_duration_since(open.opened_at);
        if elapsed < self.cfg.quantum {
            return;
        }

        let closed = &open.histogram;
        let focus_buckets = if closed.samples_count() == 0 {
            closed.focus_buckets.clone()
        } else {
            (self.cfg.focus_selector)(closed)
        };
        let into_quantum = elapsed.as_nanos() % self.cfg.quantum.as_nanos();
        let opened_at = now - Duration::from_nanos(into_quantum as u64);
        log::debug!(
            "rotating after {:?}: closed slot with {} samples, new focus buckets {:?}",
            elapsed,
            closed.count,
            focus_buckets
        );

        self.slots.push_back(Slot {
            histogram: BucketHistogram::from_parts(self.cfg.histogram_cfg, focus_buckets),
            opened_at,
        });
    }

    fn expire(&mut self, now: Instant) {
        let retention = self.cfg.retention();
        while self.slots.len() > 1 {
            let Some(oldest) = self.slots.front() else {
                break;
            };
            if now.saturating_duration_since(oldest.opened_at) <= retention {
                break;
            }
            log::debug!("evicting slot with {} samples", oldest.histogram.count);
            self.slots.pop_front();
        }
    }
}
