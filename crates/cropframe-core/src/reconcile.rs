//! Viewport resize reconciliation.
//!
//! Selections are stored in percent of the displayed box, so a resize does not
//! move them. Anything the host tracks in pixels, such as a drag in progress,
//! goes stale though. After a burst of resize events settles, the reconciler
//! asks the host to remount its crop view with fresh metrics.
//!
//! Time is supplied by the host as a monotonic `Duration` (for example
//! `performance.now()` in a browser), so nothing here owns a thread or timer.

use std::time::Duration;

use crate::ViewportMetrics;

/// Trailing-edge debounce window used for resizes.
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Trailing-edge debouncer holding at most one pending value.
///
/// Scheduling replaces the pending value and restarts the window. Once
/// released, the debouncer drops everything and ignores further schedules.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Duration, T)>,
    released: bool,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            released: false,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace any pending value; it fires `window` after `now`.
    ///
    /// Returns false if the debouncer has been released.
    pub fn schedule(&mut self, value: T, now: Duration) -> bool {
        if self.released {
            return false;
        }
        self.pending = Some((now + self.window, value));
        true
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let due = matches!(self.pending, Some((deadline, _)) if now >= deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|(_, value)| value)
    }

    /// When the host should poll next.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without firing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Cancel and dispose; nothing will fire after this.
    pub fn release(&mut self) {
        self.pending = None;
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

/// Instruction to remount the crop view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remount {
    /// New mount key; input tagged with an older key is stale
    pub key: u64,
    pub metrics: ViewportMetrics,
}

/// Debounces resizes and hands out mount keys.
#[derive(Debug, Clone)]
pub struct ResizeReconciler {
    debouncer: Debouncer<ViewportMetrics>,
    mount_key: u64,
}

impl Default for ResizeReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DEBOUNCE)
    }
}

impl ResizeReconciler {
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            mount_key: 0,
        }
    }

    pub fn mount_key(&self) -> u64 {
        self.mount_key
    }

    /// Record a resize; only the last one in a burst is kept.
    pub fn on_resize(&mut self, metrics: ViewportMetrics, now: Duration) {
        if !self.debouncer.schedule(metrics, now) {
            tracing::debug!("Resize ignored after teardown");
        }
    }

    /// Fire the settled resize, if any, bumping the mount key.
    pub fn poll(&mut self, now: Duration) -> Option<Remount> {
        let metrics = self.debouncer.poll(now)?;
        self.mount_key += 1;
        tracing::debug!(
            key = self.mount_key,
            width = metrics.displayed_width,
            height = metrics.displayed_height,
            "Remounting crop view"
        );
        Some(Remount {
            key: self.mount_key,
            metrics,
        })
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.debouncer.next_deadline()
    }

    pub fn is_current(&self, key: u64) -> bool {
        key == self.mount_key
    }

    /// Release the timer when the crop view is torn down.
    pub fn teardown(&mut self) {
        self.debouncer.release();
    }

    pub fn is_torn_down(&self) -> bool {
        self.debouncer.is_released()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: A burst fires exactly once, with its last value.
        #[test]
        fn prop_burst_fires_once(gaps in prop::collection::vec(0u64..200, 1..30)) {
            let mut debouncer = Debouncer::new(Duration::from_millis(200));
            let mut now = 0u64;
            let mut fired = Vec::new();

            for (i, gap) in gaps.iter().enumerate() {
                now += gap;
                if let Some(v) = debouncer.poll(Duration::from_millis(now)) {
                    fired.push(v);
                }
                debouncer.schedule(i, Duration::from_millis(now));
            }
            if let Some(v) = debouncer.poll(Duration::from_millis(now + 200)) {
                fired.push(v);
            }

            prop_assert_eq!(fired, vec![gaps.len() - 1]);
        }
    }
}
