//! Fixed-size collection of sensor channels addressed by small integer ids.
//!
//! Hardware variants expose subsets of the id space through an availability
//! mask; every operation on an absent or out-of-range id is a silent no-op
//! returning a neutral default, never an error.

use crate::channel::{GestureDirection, SensorChannel};
use crate::error::DeviceError;

pub const SENSOR_FLEX_INDEX_FINGER: u8 = 0;
pub const SENSOR_FLEX_MIDDLE_FINGER: u8 = 1;
pub const SENSOR_FLEX_RING_FINGER: u8 = 2;
pub const SENSOR_FLEX_LITTLE_FINGER: u8 = 3;
pub const SENSOR_DISTANCE: u8 = 4;
pub const SENSOR_ACCEL_X: u8 = 5;
pub const SENSOR_ACCEL_Y: u8 = 6;
pub const SENSOR_ACCEL_Z: u8 = 7;
pub const SENSOR_GYRO_ROLL: u8 = 8;
pub const SENSOR_GYRO_PITCH: u8 = 9;
pub const SENSOR_GYRO_HEADING: u8 = 10;

pub const SENSOR_COUNT: usize = 11;

/// Directional wave gestures, each derived from one accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureId {
    WaveLeft,
    WaveRight,
    WaveUp,
    WaveDown,
}

impl GestureId {
    pub const ALL: [GestureId; 4] = [
        GestureId::WaveLeft,
        GestureId::WaveRight,
        GestureId::WaveUp,
        GestureId::WaveDown,
    ];

    /// The channel and swing direction this gesture is read from.
    pub fn source(self) -> (u8, GestureDirection) {
        match self {
            GestureId::WaveLeft => (SENSOR_ACCEL_Y, GestureDirection::Falling),
            GestureId::WaveRight => (SENSOR_ACCEL_Y, GestureDirection::Rising),
            GestureId::WaveUp => (SENSOR_ACCEL_Z, GestureDirection::Rising),
            GestureId::WaveDown => (SENSOR_ACCEL_Z, GestureDirection::Falling),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GestureId::WaveLeft => "LL",
            GestureId::WaveRight => "RR",
            GestureId::WaveUp => "UU",
            GestureId::WaveDown => "DD",
        }
    }
}

/// One `SensorChannel` per logical sensor id plus a presence bitmask.
#[derive(Debug, Clone)]
pub struct SensorBank {
    channels: [SensorChannel; SENSOR_COUNT],
    available: u16,
}

impl Default for SensorBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBank {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| SensorChannel::default()),
            available: 0,
        }
    }

    /// Declare which sensor ids physically exist on this variant.
    pub fn set_available(&mut self, mask: u16) {
        self.available = mask;
    }

    pub fn available(&self, id: u8) -> bool {
        (id as usize) < SENSOR_COUNT && self.available & (1 << id) != 0
    }

    /// Configure the raw range and activity threshold of one channel.
    /// Absent ids are accepted and ignored; a zero-span range is rejected.
    pub fn configure(
        &mut self,
        id: u8,
        raw_min: f64,
        raw_max: f64,
        min_std_dev: f64,
    ) -> Result<(), DeviceError> {
        if !self.available(id) {
            return Ok(());
        }
        self.channels[id as usize].configure(raw_min, raw_max, min_std_dev)
    }

    /// Feed one raw sample into a channel. No-op for absent ids.
    pub fn add_measurement(&mut self, now_ms: u64, id: u8, raw: f64) {
        if self.available(id) {
            self.channels[id as usize].add_measurement(now_ms, raw);
        }
    }

    /// Latest scaled sample, or 0 for absent ids.
    pub fn value(&self, id: u8) -> u16 {
        if self.available(id) {
            self.channels[id as usize].value()
        } else {
            0
        }
    }

    pub fn activity(&self, id: u8) -> bool {
        self.available(id) && self.channels[id as usize].activity()
    }

    /// Window minimum of a channel, or 0 for absent ids.
    pub fn min_value(&self, id: u8) -> u16 {
        if self.available(id) {
            self.channels[id as usize].extreme_min()
        } else {
            0
        }
    }

    /// Window maximum of a channel, or 0 for absent ids.
    pub fn max_value(&self, id: u8) -> u16 {
        if self.available(id) {
            self.channels[id as usize].extreme_max()
        } else {
            0
        }
    }

    /// A gesture is available when its source channel is.
    pub fn gesture_available(&self, gesture: GestureId) -> bool {
        self.available(gesture.source().0)
    }

    pub fn gesture_detected(&self, gesture: GestureId, now_ms: u64) -> bool {
        let (id, direction) = gesture.source();
        self.available(id) && self.channels[id as usize].gesture_detected(direction, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(ids: &[u8]) -> u16 {
        ids.iter().fold(0, |m, id| m | (1 << id))
    }

    #[test]
    fn absent_id_is_neutral_regardless_of_measurements() {
        let mut bank = SensorBank::new();
        bank.set_available(mask(&[SENSOR_ACCEL_X, SENSOR_ACCEL_Y]));
        bank.configure(SENSOR_DISTANCE, 0.0, 1300.0, 1.0).unwrap();
        bank.add_measurement(1, SENSOR_DISTANCE, 900.0);
        assert!(!bank.available(SENSOR_DISTANCE));
        assert_eq!(bank.value(SENSOR_DISTANCE), 0);
        assert!(!bank.activity(SENSOR_DISTANCE));
    }

    #[test]
    fn out_of_range_id_is_neutral() {
        let mut bank = SensorBank::new();
        bank.set_available(u16::MAX);
        assert!(!bank.available(SENSOR_COUNT as u8));
        assert_eq!(bank.value(200), 0);
        bank.add_measurement(1, 200, 1.0);
    }

    #[test]
    fn present_id_round_trips() {
        let mut bank = SensorBank::new();
        bank.set_available(mask(&[SENSOR_ACCEL_X]));
        bank.configure(SENSOR_ACCEL_X, -10.0, 10.0, 0.1).unwrap();
        bank.add_measurement(1, SENSOR_ACCEL_X, 10.0);
        assert_eq!(bank.value(SENSOR_ACCEL_X), u16::MAX);
    }

    #[test]
    fn gestures_follow_source_channel_availability() {
        let mut bank = SensorBank::new();
        bank.set_available(mask(&[SENSOR_ACCEL_Y]));
        assert!(bank.gesture_available(GestureId::WaveLeft));
        assert!(bank.gesture_available(GestureId::WaveRight));
        assert!(!bank.gesture_available(GestureId::WaveUp));
        assert!(!bank.gesture_detected(GestureId::WaveUp, 100));
    }

    #[test]
    fn wave_right_is_rising_on_accel_y() {
        let mut bank = SensorBank::new();
        bank.set_available(mask(&[SENSOR_ACCEL_Y]));
        bank.configure(SENSOR_ACCEL_Y, -10.0, 10.0, 0.01).unwrap();
        let mut t = 0;
        for _ in 0..4 {
            t += 10;
            bank.add_measurement(t, SENSOR_ACCEL_Y, -10.0);
        }
        for _ in 0..4 {
            t += 10;
            bank.add_measurement(t, SENSOR_ACCEL_Y, 10.0);
        }
        assert!(bank.gesture_detected(GestureId::WaveRight, t));
        assert!(!bank.gesture_detected(GestureId::WaveLeft, t));
    }
}
