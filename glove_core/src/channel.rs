//! Per-sensor streaming channel: scaling, activity detection, gesture latch.
//!
//! A channel keeps the last `RING_CAPACITY` scaled samples and the
//! population mean/variance over them. Activity is "variance above a
//! configured threshold"; gestures are full-scale swings observed inside a
//! bounded latch window while active.

use crate::error::DeviceError;

/// Number of scaled samples kept per channel.
pub const RING_CAPACITY: usize = 16;
/// Top of the scaled output domain.
pub const OUT_MAX: u16 = u16::MAX;
/// A swing counts as full-scale when the window minimum dips below this
/// band and the maximum rises above `OUT_MAX - GESTURE_LOW_BAND`.
pub const GESTURE_LOW_BAND: u16 = 8192;
/// How long a latch window (and a latched gesture) lives.
pub const GESTURE_TIMEOUT_MS: u64 = 300;

/// Direction of a latched swing: which extreme came first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureDirection {
    /// Minimum was observed before the maximum.
    Rising,
    /// Maximum was observed before the minimum.
    Falling,
}

/// One physical quantity: raw range, scaled sample ring, activity and
/// gesture state.
///
/// `configure` must be called before the first measurement; a default
/// channel maps [-1, 1] and never reports activity.
#[derive(Debug, Clone)]
pub struct SensorChannel {
    raw_min: f64,
    raw_max: f64,
    factor: f64,
    activity_threshold: f64,
    samples: [u16; RING_CAPACITY],
    pos: usize,
    mean: f64,
    variance: f64,
    active: bool,
    extreme_min: u16,
    extreme_max: u16,
    time_of_min: u64,
    time_of_max: u64,
    gesture: Option<GestureDirection>,
    /// Deadline of the current latch window; 0 means no window is open.
    gesture_expiry_ms: u64,
}

const MID_SCALE: u16 = OUT_MAX / 2;

impl Default for SensorChannel {
    fn default() -> Self {
        Self {
            raw_min: -1.0,
            raw_max: 1.0,
            factor: f64::from(OUT_MAX) / 2.0,
            activity_threshold: f64::INFINITY,
            samples: [MID_SCALE; RING_CAPACITY],
            pos: 0,
            mean: f64::from(MID_SCALE),
            variance: 0.0,
            active: false,
            extreme_min: MID_SCALE,
            extreme_max: MID_SCALE,
            time_of_min: 0,
            time_of_max: 0,
            gesture: None,
            gesture_expiry_ms: 0,
        }
    }
}

impl SensorChannel {
    /// Set the raw range and activity threshold.
    ///
    /// `raw_min > raw_max` is valid and inverts polarity. A zero-span range
    /// is a configuration error. `min_std_dev` of 0 makes the channel
    /// always active.
    pub fn configure(
        &mut self,
        raw_min: f64,
        raw_max: f64,
        min_std_dev: f64,
    ) -> Result<(), DeviceError> {
        if raw_min == raw_max {
            return Err(DeviceError::Config(format!(
                "zero-span sensor range ({raw_min}..{raw_max})"
            )));
        }
        self.raw_min = raw_min;
        self.raw_max = raw_max;
        self.factor = f64::from(OUT_MAX) / (raw_max - raw_min);
        // Threshold lives in the scaled domain and is compared against the
        // population variance, so it is a squared scaled standard deviation.
        self.activity_threshold = (min_std_dev * self.factor.abs()).powi(2);
        self.samples = [MID_SCALE; RING_CAPACITY];
        self.pos = 0;
        self.mean = f64::from(MID_SCALE);
        self.variance = 0.0;
        self.active = false;
        self.gesture = None;
        self.gesture_expiry_ms = 0;
        Ok(())
    }

    /// Insert one raw sample taken at `now_ms` (monotonic milliseconds).
    pub fn add_measurement(&mut self, now_ms: u64, raw: f64) {
        if !raw.is_finite() {
            tracing::trace!(raw, "discarding non-finite sample");
            return;
        }
        let (lo, hi) = if self.raw_min < self.raw_max {
            (self.raw_min, self.raw_max)
        } else {
            (self.raw_max, self.raw_min)
        };
        let clamped = raw.clamp(lo, hi);
        let scaled = ((clamped - self.raw_min) * self.factor)
            .round()
            .clamp(0.0, f64::from(OUT_MAX)) as u16;

        self.samples[self.pos] = scaled;
        self.pos = (self.pos + 1) % RING_CAPACITY;
        self.recompute_stats();
        self.active = self.variance > self.activity_threshold;
        self.track_gesture(now_ms, scaled);
    }

    /// Population mean/variance over the full ring. O(N), N small.
    fn recompute_stats(&mut self) {
        let n = RING_CAPACITY as f64;
        let mut sum = 0.0;
        for s in &self.samples {
            sum += f64::from(*s);
        }
        let mean = sum / n;
        let mut sq = 0.0;
        for s in &self.samples {
            let d = f64::from(*s) - mean;
            sq += d * d;
        }
        self.mean = mean;
        self.variance = sq / n;
    }

    fn track_gesture(&mut self, now_ms: u64, scaled: u16) {
        if !self.active {
            self.gesture = None;
            self.gesture_expiry_ms = 0;
            return;
        }

        if now_ms >= self.gesture_expiry_ms {
            // Window expired (or none open): start a new one at the current
            // sample. A latched gesture dies with its window.
            self.gesture = None;
            self.extreme_min = scaled;
            self.extreme_max = scaled;
            self.time_of_min = now_ms;
            self.time_of_max = now_ms;
            self.gesture_expiry_ms = now_ms + GESTURE_TIMEOUT_MS;
        } else {
            if scaled < self.extreme_min {
                self.extreme_min = scaled;
                self.time_of_min = now_ms;
            }
            if scaled > self.extreme_max {
                self.extreme_max = scaled;
                self.time_of_max = now_ms;
            }
        }

        // Full-scale swing inside the window: latch and refresh the window.
        // The same axis yields two meanings from which extreme came first.
        if self.extreme_min < GESTURE_LOW_BAND && self.extreme_max > OUT_MAX - GESTURE_LOW_BAND {
            self.gesture = Some(if self.time_of_min < self.time_of_max {
                GestureDirection::Rising
            } else {
                GestureDirection::Falling
            });
            self.gesture_expiry_ms = now_ms + GESTURE_TIMEOUT_MS;
        }
    }

    /// The most recent scaled sample. The ring exists for variance
    /// estimation, not output smoothing.
    pub fn value(&self) -> u16 {
        self.samples[(self.pos + RING_CAPACITY - 1) % RING_CAPACITY]
    }

    /// Whether recent-sample variance exceeds the configured threshold.
    pub fn activity(&self) -> bool {
        self.active
    }

    /// Smallest scaled sample in the current latch window.
    pub fn extreme_min(&self) -> u16 {
        self.extreme_min
    }

    /// Largest scaled sample in the current latch window.
    pub fn extreme_max(&self) -> u16 {
        self.extreme_max
    }

    /// True while a matching gesture is latched and unexpired.
    pub fn gesture_detected(&self, direction: GestureDirection, now_ms: u64) -> bool {
        self.gesture == Some(direction) && now_ms < self.gesture_expiry_ms
    }

    #[cfg(test)]
    pub(crate) fn variance(&self) -> f64 {
        self.variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_channel() -> SensorChannel {
        let mut ch = SensorChannel::default();
        ch.configure(-10.0, 10.0, 0.01).unwrap();
        ch
    }

    #[test]
    fn rejects_zero_span_range() {
        let mut ch = SensorChannel::default();
        assert!(matches!(
            ch.configure(3.0, 3.0, 1.0),
            Err(DeviceError::Config(_))
        ));
    }

    #[test]
    fn scales_endpoints_to_output_domain() {
        let mut ch = active_channel();
        ch.add_measurement(1, -10.0);
        assert_eq!(ch.value(), 0);
        ch.add_measurement(2, 10.0);
        assert_eq!(ch.value(), OUT_MAX);
        ch.add_measurement(3, 0.0);
        assert_eq!(ch.value(), MID_SCALE + 1); // 0.5 rounds up
    }

    #[test]
    fn clamps_out_of_range_samples() {
        let mut ch = active_channel();
        ch.add_measurement(1, -1000.0);
        assert_eq!(ch.value(), 0);
        ch.add_measurement(2, 1000.0);
        assert_eq!(ch.value(), OUT_MAX);
    }

    #[test]
    fn inverted_range_flips_polarity() {
        let mut ch = SensorChannel::default();
        ch.configure(10.0, -10.0, 0.01).unwrap();
        ch.add_measurement(1, 10.0);
        assert_eq!(ch.value(), 0);
        ch.add_measurement(2, -10.0);
        assert_eq!(ch.value(), OUT_MAX);
    }

    #[test]
    fn steady_signal_goes_inactive_after_fill() {
        let mut ch = SensorChannel::default();
        ch.configure(-10.0, 10.0, 0.5).unwrap();
        for t in 0..(2 * RING_CAPACITY as u64) {
            ch.add_measurement(t, 4.2);
        }
        assert_eq!(ch.variance(), 0.0);
        assert!(!ch.activity());
    }

    #[test]
    fn zero_min_std_dev_is_always_active() {
        let mut ch = SensorChannel::default();
        ch.configure(-10.0, 10.0, 0.0).unwrap();
        for t in 0..(2 * RING_CAPACITY as u64) {
            ch.add_measurement(t, 1.0);
        }
        // Ring holds the fill value plus initial mid-scale entries at first,
        // but even a fully settled ring has variance 0, which does not
        // exceed a 0 threshold. Feed a tiny wiggle to confirm the gate.
        ch.add_measurement(100, 1.0001);
        assert!(ch.activity());
    }

    #[test]
    fn full_swing_latches_rising_until_timeout() {
        let mut ch = active_channel();
        let mut t = 0;
        for _ in 0..4 {
            t += 10;
            ch.add_measurement(t, -10.0);
        }
        for _ in 0..4 {
            t += 10;
            ch.add_measurement(t, 10.0);
        }
        assert!(ch.gesture_detected(GestureDirection::Rising, t));
        assert!(!ch.gesture_detected(GestureDirection::Falling, t));
        // Latch expires without further samples.
        let after = t + GESTURE_TIMEOUT_MS;
        assert!(!ch.gesture_detected(GestureDirection::Rising, after));
        assert!(!ch.gesture_detected(GestureDirection::Falling, after));
    }

    #[test]
    fn reverse_swing_latches_falling() {
        let mut ch = active_channel();
        let mut t = 0;
        for _ in 0..4 {
            t += 10;
            ch.add_measurement(t, 10.0);
        }
        for _ in 0..4 {
            t += 10;
            ch.add_measurement(t, -10.0);
        }
        assert!(ch.gesture_detected(GestureDirection::Falling, t));
        assert!(!ch.gesture_detected(GestureDirection::Rising, t));
    }

    #[test]
    fn swing_split_across_windows_does_not_latch() {
        let mut ch = active_channel();
        ch.add_measurement(10, -10.0);
        ch.add_measurement(20, -10.0);
        // The window that saw the minimum has expired by the time the
        // maximum arrives, so no full swing is observed.
        let late = 20 + GESTURE_TIMEOUT_MS + 50;
        ch.add_measurement(late, 10.0);
        assert!(!ch.gesture_detected(GestureDirection::Rising, late));
        assert!(!ch.gesture_detected(GestureDirection::Falling, late));
    }

    #[test]
    fn inactivity_clears_latched_gesture() {
        let mut ch = active_channel();
        let mut t = 0;
        for _ in 0..4 {
            t += 10;
            ch.add_measurement(t, -10.0);
        }
        for _ in 0..4 {
            t += 10;
            ch.add_measurement(t, 10.0);
        }
        assert!(ch.gesture_detected(GestureDirection::Rising, t));
        // Flood the ring with a steady value: variance drops, channel goes
        // inactive, gesture state is cleared.
        for _ in 0..(2 * RING_CAPACITY) {
            t += 10;
            ch.add_measurement(t, 0.0);
        }
        assert!(!ch.activity());
        assert!(!ch.gesture_detected(GestureDirection::Rising, t));
    }
}
