pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Raw input port: button bits and per-channel sensor samples.
///
/// Implementations wrap the board's concrete chips (port expanders, flex
/// ADCs, ToF ranger, IMU). A channel that exists on the board but has no
/// fresh sample this tick returns `Ok(None)`.
pub trait InputSource {
    /// Read the current raw button bit-vector (bit n = button id n).
    fn read_buttons(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;

    /// Read the latest raw sample for a sensor channel, if one is ready.
    fn read_sensor(
        &mut self,
        id: u8,
    ) -> Result<Option<f64>, Box<dyn std::error::Error + Send + Sync>>;

    /// Whether the given sensor channel physically exists on this source.
    fn sensor_present(&self, id: u8) -> bool;

    /// Re-zero the orientation reference of the inertial unit, if any.
    /// Returns false when the source has no IMU to reset.
    fn reset_orientation(&mut self) -> bool {
        false
    }
}

/// Font selection for the display port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Small,
    Large,
}

/// Horizontal text alignment for the display port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Small monochrome display port.
///
/// Draw calls are infallible; a display that has gone away simply drops
/// frames and reports `!ready()`.
pub trait Display {
    fn ready(&self) -> bool;
    fn clear(&mut self);
    fn set_font(&mut self, font: Font);
    fn set_align(&mut self, align: Align);
    fn draw_text(&mut self, x: u8, y: u8, text: &str);
    fn draw_rect(&mut self, x: u8, y: u8, w: u8, h: u8);
    fn fill_rect(&mut self, x: u8, y: u8, w: u8, h: u8);
    /// Push the assembled frame to the panel.
    fn present(&mut self);
}

/// Byte-addressed persistent storage port (EEPROM-like, no transactions).
///
/// A missing or unreadable key reads as 0.
pub trait Storage {
    fn read_byte(&mut self, key: u16) -> u8;
    fn write_byte(&mut self, key: u16, value: u8);
}

/// Serial-like outbound transport port consumed by the protocol adapters.
pub trait Transport {
    fn connected(&self) -> bool;
    fn bytes_available(&self) -> usize;
    /// Pop one inbound byte, if any.
    fn read_byte(&mut self) -> Option<u8>;
    fn write_byte(&mut self, byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }
}
