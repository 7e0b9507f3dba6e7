//! Runtime configuration types for the device core.
//!
//! These are the structs the builder consumes. They are separate from the
//! TOML-deserialized schema in `glove_config`; see `conversions` for the
//! mapping.

use crate::bank::{
    SENSOR_ACCEL_X, SENSOR_ACCEL_Y, SENSOR_ACCEL_Z, SENSOR_COUNT, SENSOR_DISTANCE,
    SENSOR_FLEX_INDEX_FINGER, SENSOR_FLEX_LITTLE_FINGER, SENSOR_FLEX_MIDDLE_FINGER,
    SENSOR_FLEX_RING_FINGER, SENSOR_GYRO_HEADING, SENSOR_GYRO_PITCH, SENSOR_GYRO_ROLL,
};
use crate::buttons::LONG_PRESS_MS;
use crate::protocol::ProtocolKind;

/// Raw range and activity threshold of one channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelCfg {
    /// Raw value mapped to scaled 0. May exceed `raw_max` to invert polarity.
    pub raw_min: f64,
    /// Raw value mapped to scaled 65535.
    pub raw_max: f64,
    /// Minimum raw standard deviation that counts as activity. 0 = always
    /// active.
    pub min_std_dev: f64,
}

/// Calibration defaults per sensor id, used where the TOML config is silent.
pub fn default_channels() -> [ChannelCfg; SENSOR_COUNT] {
    let mut table = [ChannelCfg {
        raw_min: -1.0,
        raw_max: 1.0,
        min_std_dev: 0.0,
    }; SENSOR_COUNT];
    let flex = ChannelCfg {
        raw_min: 0.0,
        raw_max: 1023.0,
        min_std_dev: 2.0,
    };
    for id in [
        SENSOR_FLEX_INDEX_FINGER,
        SENSOR_FLEX_MIDDLE_FINGER,
        SENSOR_FLEX_RING_FINGER,
        SENSOR_FLEX_LITTLE_FINGER,
    ] {
        table[id as usize] = flex;
    }
    table[SENSOR_DISTANCE as usize] = ChannelCfg {
        raw_min: 0.0,
        raw_max: 1300.0,
        min_std_dev: 5.0,
    };
    let accel = ChannelCfg {
        raw_min: -12.0,
        raw_max: 12.0,
        min_std_dev: 0.2,
    };
    for id in [SENSOR_ACCEL_X, SENSOR_ACCEL_Y, SENSOR_ACCEL_Z] {
        table[id as usize] = accel;
    }
    table[SENSOR_GYRO_ROLL as usize] = ChannelCfg {
        raw_min: -90.0,
        raw_max: 90.0,
        min_std_dev: 1.0,
    };
    table[SENSOR_GYRO_PITCH as usize] = ChannelCfg {
        raw_min: -180.0,
        raw_max: 180.0,
        min_std_dev: 1.0,
    };
    table[SENSOR_GYRO_HEADING as usize] = ChannelCfg {
        raw_min: -180.0,
        raw_max: 180.0,
        min_std_dev: 1.0,
    };
    table
}

/// Button timing configuration.
#[derive(Debug, Clone, Copy)]
pub struct ButtonCfg {
    /// Hold duration before the long-press combo latches.
    pub long_press_ms: u64,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self {
            long_press_ms: LONG_PRESS_MS,
        }
    }
}

/// Which protocol boots by default and how the board identifies itself.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolCfg {
    pub default: ProtocolKind,
    /// Junxion board id, 1 through 4. Sent as an ASCII digit on the wire.
    pub board_id: u8,
}

impl Default for ProtocolCfg {
    fn default() -> Self {
        Self {
            default: ProtocolKind::Junxion,
            board_id: 3,
        }
    }
}
