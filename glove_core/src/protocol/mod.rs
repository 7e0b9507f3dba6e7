//! Host protocol adapters.
//!
//! Both adapters run as behaviours on the UI stack: while one is on top it
//! owns the transport and the screen. The shared pieces here define which
//! digital and analog signals go on the wire and in what order.

pub mod junxion;
pub mod maxmsp;

pub use junxion::Junxion;
pub use maxmsp::MaxMsp;

use crate::bank::{
    GestureId, SensorBank, SENSOR_ACCEL_X, SENSOR_ACCEL_Y, SENSOR_ACCEL_Z, SENSOR_DISTANCE,
    SENSOR_FLEX_INDEX_FINGER, SENSOR_FLEX_LITTLE_FINGER, SENSOR_FLEX_MIDDLE_FINGER,
    SENSOR_FLEX_RING_FINGER, SENSOR_GYRO_HEADING, SENSOR_GYRO_PITCH, SENSOR_GYRO_ROLL,
};
use crate::buttons::ButtonBank;

/// Which adapter boots when the home screen resolves the stored selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    Junxion,
    Max,
}

impl ProtocolKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Junxion),
            1 => Some(Self::Max),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Junxion => 0,
            Self::Max => 1,
        }
    }
}

/// One digital slot on the wire: a physical button or a latched gesture.
#[derive(Debug, Clone, Copy)]
pub enum DigitalSlot {
    Button(u8),
    Gesture(GestureId),
}

/// Wire order of the digital slots. Gestures sit between the two button
/// groups so hosts see them at fixed indices regardless of variant.
pub const DIGITAL_SLOTS: [DigitalSlot; 16] = [
    DigitalSlot::Button(0),
    DigitalSlot::Button(1),
    DigitalSlot::Button(2),
    DigitalSlot::Button(3),
    DigitalSlot::Button(4),
    DigitalSlot::Button(5),
    DigitalSlot::Button(6),
    DigitalSlot::Button(7),
    DigitalSlot::Gesture(GestureId::WaveLeft),
    DigitalSlot::Gesture(GestureId::WaveRight),
    DigitalSlot::Gesture(GestureId::WaveUp),
    DigitalSlot::Gesture(GestureId::WaveDown),
    DigitalSlot::Button(8),
    DigitalSlot::Button(9),
    DigitalSlot::Button(10),
    DigitalSlot::Button(11),
];

/// Wire order of the analog channels.
pub const ANALOG_ORDER: [u8; 11] = [
    SENSOR_DISTANCE,
    SENSOR_ACCEL_X,
    SENSOR_ACCEL_Y,
    SENSOR_ACCEL_Z,
    SENSOR_GYRO_PITCH,
    SENSOR_GYRO_ROLL,
    SENSOR_GYRO_HEADING,
    SENSOR_FLEX_INDEX_FINGER,
    SENSOR_FLEX_MIDDLE_FINGER,
    SENSOR_FLEX_RING_FINGER,
    SENSOR_FLEX_LITTLE_FINGER,
];

impl DigitalSlot {
    /// Whether this slot exists on the current hardware variant.
    pub fn available(&self, sensors: &SensorBank, buttons: &ButtonBank) -> bool {
        match *self {
            DigitalSlot::Button(id) => buttons.available(id),
            DigitalSlot::Gesture(g) => sensors.gesture_available(g),
        }
    }

    /// Current on/off value of the slot.
    pub fn active(&self, sensors: &SensorBank, buttons: &ButtonBank, now_ms: u64) -> bool {
        match *self {
            DigitalSlot::Button(id) => buttons.pressed(id),
            DigitalSlot::Gesture(g) => sensors.gesture_detected(g, now_ms),
        }
    }
}

/// One tick's worth of wire data, already reduced to available slots.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub digital_words: Vec<u16>,
    pub analog: Vec<u16>,
}

/// Pack digital values into 16-bit words, first value in bit 0 of the
/// first word. A trailing partial word is zero-padded.
pub fn pack_digital(bits: impl IntoIterator<Item = bool>) -> Vec<u16> {
    let mut words = Vec::new();
    for (i, bit) in bits.into_iter().enumerate() {
        if i % 16 == 0 {
            words.push(0u16);
        }
        if bit {
            let last = words.len() - 1;
            words[last] |= 1 << (i % 16);
        }
    }
    words
}

/// Collect the available digital slots and analog channels for one frame.
pub fn capture(sensors: &SensorBank, buttons: &ButtonBank, now_ms: u64) -> Snapshot {
    let digital_words = pack_digital(
        DIGITAL_SLOTS
            .iter()
            .filter(|s| s.available(sensors, buttons))
            .map(|s| s.active(sensors, buttons, now_ms)),
    );
    let analog = ANALOG_ORDER
        .iter()
        .filter(|&&id| sensors.available(id))
        .map(|&id| sensors.value(id))
        .collect();
    Snapshot {
        digital_words,
        analog,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_digital_sets_ascending_bits() {
        let words = pack_digital([true, false, true].into_iter());
        assert_eq!(words, vec![0b101]);
    }

    #[test]
    fn pack_digital_spills_into_second_word() {
        let mut bits = vec![false; 20];
        bits[0] = true;
        bits[15] = true;
        bits[16] = true;
        bits[19] = true;
        let words = pack_digital(bits.into_iter());
        assert_eq!(words, vec![0x8001, 0b1001]);
    }

    #[test]
    fn pack_digital_empty_is_empty() {
        assert!(pack_digital(std::iter::empty()).is_empty());
    }

    #[test]
    fn capture_skips_unavailable_slots() {
        let mut sensors = SensorBank::new();
        sensors.set_available(0); // no sensors, no gestures
        let mut buttons = ButtonBank::new();
        buttons.set_available(0b1111);
        buttons.update(0, 0b0101);
        let snap = capture(&sensors, &buttons, 0);
        assert_eq!(snap.digital_words, vec![0b0101]);
        assert!(snap.analog.is_empty());
    }
}
