use serde::Serialize;

use crate::common::atr_exception::AtrException;
use crate::config::tracker_config::TrackerConfig;
use crate::window::bounded_window::BoundedWindow;

/// Snapshot of the tracker's derived levels after a push.
#[derive(Debug, Clone, Serialize)]
pub struct BandMetric {
    pub current: f64,
    pub median: f64,
    pub upper_band: f64,
    pub mid_band: f64,
    pub lower_band: f64,
    pub inner_upper: f64,
    pub inner_lower: f64,
}

/// Rolling-median breakout band tracker.
///
/// Consumes one volatility magnitude sample (e.g. an ATR value, computed
/// by the caller) and one high/low pair per period. Maintains the median
/// of the last `window_capacity` magnitudes, and a pair of outer bands
/// anchored to price extremes plus the scaled median. The bands are a
/// one-way ratchet: they are recomputed only when a high/low breaches
/// the previous band values, and only contract via `reset()`.
///
/// Single-threaded by design. Pushes against one tracker must be
/// serialized by the caller; independent trackers share no state.
#[derive(Debug)]
pub struct BandTracker {
    multiplier: f64,
    range_percentage: f64,
    window: BoundedWindow<f64>,
    current: f64,
    median: f64,
    upper_band: f64,
    lower_band: f64,
    mid_band: f64,
    inner_upper: f64,
    inner_lower: f64,
}

impl BandTracker {
    /// Fails only for a zero window capacity.
    ///
    /// A negative `multiplier` is legal and inverts the band orientation.
    /// `range_percentage` outside `[0, 50]` lets the inner levels cross;
    /// the config layer clamps it to `[0, 100]`, and callers driving the
    /// tracker directly are expected to do the same.
    pub fn new(
        window_capacity: usize,
        multiplier: f64,
        range_percentage: f64,
    ) -> Result<Self, AtrException> {
        Ok(Self {
            multiplier,
            range_percentage,
            window: BoundedWindow::new(window_capacity)?,
            current: 0.0,
            median: 0.0,
            upper_band: 0.0,
            lower_band: 0.0,
            mid_band: 0.0,
            inner_upper: 0.0,
            inner_lower: 0.0,
        })
    }

    pub fn from_config(conf: &TrackerConfig) -> Result<Self, AtrException> {
        Self::new(conf.median_period, conf.atr_multiplier, conf.range_percentage)
    }

    /// One call per period, in arrival order.
    ///
    /// Appends `magnitude` to the window (evicting the oldest when full),
    /// recomputes the rolling median, and recomputes the bands only when
    /// `high` breaks the previous upper band or `low` breaks the previous
    /// lower band. The very first push trivially breaks the zero
    /// sentinel bands for any positive price.
    ///
    /// Non-finite inputs propagate without detection: a NaN high/low
    /// fails both breakout comparisons and leaves the bands frozen, and
    /// a NaN magnitude poisons the median until it is evicted.
    pub fn push(&mut self, magnitude: f64, high: f64, low: f64) {
        self.window.push(magnitude);
        self.median = Self::median_of(&self.window.to_sorted_vec());

        // Update only if the new high breaks the previous upper band or
        // the new low breaks the previous lower band.
        if high > self.upper_band || low < self.lower_band {
            self.upper_band = high + self.median * self.multiplier;
            self.lower_band = low - self.median * self.multiplier;
            self.mid_band = (self.upper_band + self.lower_band) / 2.0;
            self.update_ranges();
        }

        self.current = magnitude;
    }

    /// Back to the uninitialized state: window cleared, every derived
    /// field zeroed. Configuration is retained.
    pub fn reset(&mut self) {
        self.window.clear();
        self.current = 0.0;
        self.median = 0.0;
        self.upper_band = 0.0;
        self.lower_band = 0.0;
        self.mid_band = 0.0;
        self.inner_upper = 0.0;
        self.inner_lower = 0.0;
    }

    pub fn current_magnitude(&self) -> f64 {
        self.current
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    pub fn upper_band(&self) -> f64 {
        self.upper_band
    }

    pub fn mid_band(&self) -> f64 {
        self.mid_band
    }

    pub fn lower_band(&self) -> f64 {
        self.lower_band
    }

    pub fn inner_upper(&self) -> f64 {
        self.inner_upper
    }

    pub fn inner_lower(&self) -> f64 {
        self.inner_lower
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// True once the window holds a full `median_period` of samples.
    pub fn is_warmed_up(&self) -> bool {
        self.window.is_full()
    }

    pub fn metric(&self) -> BandMetric {
        BandMetric {
            current: self.current,
            median: self.median,
            upper_band: self.upper_band,
            mid_band: self.mid_band,
            lower_band: self.lower_band,
            inner_upper: self.inner_upper,
            inner_lower: self.inner_lower,
        }
    }

    fn update_ranges(&mut self) {
        let span = self.upper_band - self.lower_band;
        self.inner_upper = self.upper_band - span * (self.range_percentage / 100.0);
        self.inner_lower = self.lower_band + span * (self.range_percentage / 100.0);
    }

    fn median_of(sorted: &[f64]) -> f64 {
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(capacity: usize, multiplier: f64, range_percentage: f64) -> BandTracker {
        BandTracker::new(capacity, multiplier, range_percentage).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(BandTracker::new(0, 1.0, 20.0).is_err());
    }

    #[test]
    fn test_first_push_bootstraps_bands() {
        let mut t = tracker(4, 1.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        assert_eq!(t.median(), 1.0);
        assert_eq!(t.upper_band(), 11.0);
        assert_eq!(t.lower_band(), 8.0);
        assert_eq!(t.mid_band(), 9.5);
        assert_eq!(t.current_magnitude(), 1.0);
        assert_eq!(t.sample_count(), 1);
        assert!(!t.is_warmed_up());
    }

    #[test]
    fn test_sequence_with_touching_and_inside_bars() {
        // capacity 4, multiplier 1.0, range 20%. Bar 2 exactly touches
        // the bar-1 bands and bar 4 stays inside the bar-3 bands, so
        // only bars 1 and 3 recompute; the median still slides every bar.
        let mut t = tracker(4, 1.0, 20.0);

        t.push(1.0, 10.0, 9.0);
        assert_eq!(t.upper_band(), 11.0);
        assert_eq!(t.lower_band(), 8.0);

        t.push(2.0, 11.0, 8.0); // touch, no recompute
        assert_eq!(t.median(), 1.5);
        assert_eq!(t.upper_band(), 11.0);
        assert_eq!(t.lower_band(), 8.0);

        t.push(3.0, 12.0, 7.0); // 12 > 11, recompute off median 2.0
        assert_eq!(t.upper_band(), 14.0);
        assert_eq!(t.lower_band(), 5.0);

        t.push(4.0, 13.0, 6.0); // inside (5, 14), frozen
        assert_eq!(t.median(), 2.5);
        assert_eq!(t.upper_band(), 14.0);
        assert_eq!(t.lower_band(), 5.0);
        assert_eq!(t.mid_band(), 9.5);
        // inner levels still derive from the bar-3 recompute, span 9
        assert!((t.inner_upper() - 12.2).abs() < 1e-9);
        assert!((t.inner_lower() - 6.8).abs() < 1e-9);
        assert_eq!(t.current_magnitude(), 4.0);
        assert!(t.is_warmed_up());
    }

    #[test]
    fn test_sequence_where_every_bar_breaks_out() {
        // capacity 4, multiplier 1.0, range 20%; each high strictly
        // exceeds the previous upper band
        let mut t = tracker(4, 1.0, 20.0);
        let bars = [
            (1.0, 10.0, 9.0),  // bootstrap: upper 11, lower 8
            (2.0, 11.5, 7.5),  // median 1.5: upper 13, lower 6
            (3.0, 13.5, 5.5),  // median 2.0: upper 15.5, lower 3.5
            (4.0, 16.0, 3.0),  // median 2.5: upper 18.5, lower 0.5
        ];
        for (magnitude, high, low) in bars {
            t.push(magnitude, high, low);
        }
        assert_eq!(t.median(), 2.5);
        assert_eq!(t.upper_band(), 18.5);
        assert_eq!(t.lower_band(), 0.5);
        assert_eq!(t.mid_band(), 9.5);
        // span 18
        assert!((t.inner_upper() - 14.9).abs() < 1e-9);
        assert!((t.inner_lower() - 4.1).abs() < 1e-9);
        assert!(t.is_warmed_up());
    }

    #[test]
    fn test_median_tracks_sliding_window() {
        let mut t = tracker(3, 0.0, 0.0);
        let magnitudes = [5.0, 1.0, 4.0, 2.0, 8.0];
        let expected = [5.0, 3.0, 4.0, 2.0, 4.0];
        for (m, want) in magnitudes.iter().zip(expected) {
            t.push(*m, 100.0, 1.0);
            assert_eq!(t.median(), want);
        }
    }

    #[test]
    fn test_no_breakout_leaves_bands_untouched() {
        let mut t = tracker(4, 1.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        let before = t.metric();
        // inside (8.0, 11.0): no recompute even though the median moves
        t.push(5.0, 10.5, 8.5);
        assert_eq!(t.upper_band(), before.upper_band);
        assert_eq!(t.lower_band(), before.lower_band);
        assert_eq!(t.mid_band(), before.mid_band);
        assert_eq!(t.inner_upper(), before.inner_upper);
        assert_eq!(t.inner_lower(), before.inner_lower);
        // but the rolling fields still advance
        assert_eq!(t.current_magnitude(), 5.0);
        assert_eq!(t.median(), 3.0);
    }

    #[test]
    fn test_touching_band_is_not_a_breakout() {
        let mut t = tracker(4, 1.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        let before = t.metric();
        // high == upper band, low == lower band: strict comparison, no update
        t.push(1.0, before.upper_band, before.lower_band);
        assert_eq!(t.upper_band(), before.upper_band);
        assert_eq!(t.lower_band(), before.lower_band);
    }

    #[test]
    fn test_breakout_recomputes_from_new_median() {
        let mut t = tracker(4, 2.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        // high 13.0 > upper 12.0; median over [1, 3] = 2
        t.push(3.0, 13.0, 9.5);
        assert_eq!(t.median(), 2.0);
        assert_eq!(t.upper_band(), 13.0 + 2.0 * 2.0);
        assert_eq!(t.lower_band(), 9.5 - 2.0 * 2.0);
    }

    #[test]
    fn test_bands_widen_monotonically() {
        let mut t = tracker(5, 1.5, 25.0);
        // breaching bars extend both extremes; the rest stay inside
        let bars = [
            (1.2, 10.0, 9.0),
            (0.8, 10.5, 9.4),
            (2.0, 14.0, 5.0),
            (1.1, 13.0, 8.0),
            (3.0, 20.0, 2.0),
        ];
        let mut prev_upper = f64::NEG_INFINITY;
        let mut prev_lower = f64::INFINITY;
        for (magnitude, high, low) in bars {
            t.push(magnitude, high, low);
            assert!(t.upper_band() >= prev_upper);
            assert!(t.lower_band() <= prev_lower);
            prev_upper = t.upper_band();
            prev_lower = t.lower_band();
        }
    }

    #[test]
    fn test_inner_range_containment() {
        let mut t = tracker(4, 1.0, 35.0);
        let bars = [(1.0, 10.0, 9.0), (2.0, 12.0, 7.0), (1.5, 15.0, 6.5)];
        for (magnitude, high, low) in bars {
            t.push(magnitude, high, low);
            assert!(t.lower_band() <= t.inner_lower());
            assert!(t.inner_lower() <= t.inner_upper());
            assert!(t.inner_upper() <= t.upper_band());
        }
    }

    #[test]
    fn test_reset_idempotent() {
        let mut t = tracker(4, 1.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        t.push(2.0, 12.0, 8.0);
        t.reset();
        t.reset();
        assert_eq!(t.sample_count(), 0);
        assert_eq!(t.current_magnitude(), 0.0);
        assert_eq!(t.median(), 0.0);
        assert_eq!(t.upper_band(), 0.0);
        assert_eq!(t.lower_band(), 0.0);
        assert_eq!(t.mid_band(), 0.0);
        assert_eq!(t.inner_upper(), 0.0);
        assert_eq!(t.inner_lower(), 0.0);
        // configuration survives: same bootstrap as a fresh tracker
        t.push(1.0, 10.0, 9.0);
        assert_eq!(t.upper_band(), 11.0);
        assert_eq!(t.lower_band(), 8.0);
    }

    #[test]
    fn test_degenerate_configs() {
        // capacity 1: median is always the last magnitude
        let mut t = tracker(1, 1.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        t.push(7.0, 20.0, 5.0);
        assert_eq!(t.median(), 7.0);
        assert_eq!(t.upper_band(), 27.0);

        // multiplier 0: bands coincide with the price extremes
        let mut t = tracker(4, 0.0, 20.0);
        t.push(3.0, 10.0, 9.0);
        assert_eq!(t.upper_band(), 10.0);
        assert_eq!(t.lower_band(), 9.0);

        // range 0: inner levels sit on the outer bands
        let mut t = tracker(4, 1.0, 0.0);
        t.push(1.0, 10.0, 9.0);
        assert_eq!(t.inner_upper(), t.upper_band());
        assert_eq!(t.inner_lower(), t.lower_band());
    }

    #[test]
    fn test_nan_prices_freeze_bands() {
        let mut t = tracker(4, 1.0, 20.0);
        t.push(1.0, 10.0, 9.0);
        let before = t.metric();
        // NaN fails both breakout comparisons, so the bands stay put
        t.push(1.0, f64::NAN, f64::NAN);
        assert_eq!(t.upper_band(), before.upper_band);
        assert_eq!(t.lower_band(), before.lower_band);
        assert_eq!(t.inner_upper(), before.inner_upper);
        assert_eq!(t.inner_lower(), before.inner_lower);
    }

    #[test]
    fn test_nan_magnitude_evicted_by_window() {
        let mut t = tracker(2, 0.0, 0.0);
        t.push(f64::NAN, 10.0, 9.0);
        t.push(2.0, 11.0, 8.0);
        // NaN still in the window; the even-count average poisons the median
        assert!(t.median().is_nan());
        t.push(4.0, 12.0, 7.0);
        // NaN evicted: median over [2, 4]
        assert_eq!(t.median(), 3.0);
    }

    #[test]
    fn test_from_config_defaults() {
        let conf = TrackerConfig::default();
        let mut t = BandTracker::from_config(&conf).unwrap();
        for _ in 0..conf.median_period {
            t.push(1.0, 10.0, 9.0);
        }
        assert!(t.is_warmed_up());
        assert_eq!(t.sample_count(), 4);
    }
}
