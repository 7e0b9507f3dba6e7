//! Test and helper mocks for glove_core.

use std::collections::{HashMap, VecDeque};

use glove_traits::{Align, Display, Font, InputSource, Storage, Transport};

type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Input source fed from pre-recorded samples; each read pops one value.
/// The last button word is repeated once the script runs out.
#[derive(Default)]
pub struct ScriptedInput {
    buttons: VecDeque<u16>,
    last_buttons: u16,
    sensors: HashMap<u8, VecDeque<f64>>,
    present_mask: u16,
    pub orientation_resets: u32,
}

impl ScriptedInput {
    pub fn new(present_mask: u16) -> Self {
        Self {
            present_mask,
            ..Self::default()
        }
    }

    pub fn push_buttons(&mut self, raw: u16) {
        self.buttons.push_back(raw);
    }

    pub fn push_sensor(&mut self, id: u8, raw: f64) {
        self.sensors.entry(id).or_default().push_back(raw);
    }
}

impl InputSource for ScriptedInput {
    fn read_buttons(&mut self) -> HwResult<u16> {
        if let Some(raw) = self.buttons.pop_front() {
            self.last_buttons = raw;
        }
        Ok(self.last_buttons)
    }

    fn read_sensor(&mut self, id: u8) -> HwResult<Option<f64>> {
        Ok(self.sensors.get_mut(&id).and_then(VecDeque::pop_front))
    }

    fn sensor_present(&self, id: u8) -> bool {
        id < 16 && self.present_mask & (1 << id) != 0
    }

    fn reset_orientation(&mut self) -> bool {
        self.orientation_resets += 1;
        true
    }
}

/// Display that records draw calls as readable strings.
#[derive(Default)]
pub struct RecordingDisplay {
    pub calls: Vec<String>,
    pub presented: u32,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any text drawn since the last clear contains `needle`.
    pub fn shows(&self, needle: &str) -> bool {
        self.calls.iter().any(|c| c.contains(needle))
    }
}

impl Display for RecordingDisplay {
    fn ready(&self) -> bool {
        true
    }

    fn clear(&mut self) {
        self.calls.clear();
    }

    fn set_font(&mut self, _font: Font) {}

    fn set_align(&mut self, _align: Align) {}

    fn draw_text(&mut self, x: u8, y: u8, text: &str) {
        self.calls.push(format!("text({x},{y}): {text}"));
    }

    fn draw_rect(&mut self, x: u8, y: u8, w: u8, h: u8) {
        self.calls.push(format!("rect({x},{y},{w},{h})"));
    }

    fn fill_rect(&mut self, x: u8, y: u8, w: u8, h: u8) {
        self.calls.push(format!("fill({x},{y},{w},{h})"));
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}

/// In-memory key/value storage; unwritten slots read as 0.
#[derive(Default)]
pub struct MemStorage {
    bytes: HashMap<u16, u8>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(mut self, key: u16, value: u8) -> Self {
        self.bytes.insert(key, value);
        self
    }
}

impl Storage for MemStorage {
    fn read_byte(&mut self, key: u16) -> u8 {
        self.bytes.get(&key).copied().unwrap_or(0)
    }

    fn write_byte(&mut self, key: u16, value: u8) {
        self.bytes.insert(key, value);
    }
}

/// Transport with separate inbound and outbound buffers, so tests can
/// script host traffic and inspect what the device wrote.
pub struct PipeTransport {
    pub connected: bool,
    inbound: VecDeque<u8>,
    pub outbound: Vec<u8>,
}

impl Default for PipeTransport {
    fn default() -> Self {
        Self {
            connected: true,
            inbound: VecDeque::new(),
            outbound: Vec::new(),
        }
    }
}

impl PipeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::default()
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }
}

impl Transport for PipeTransport {
    fn connected(&self) -> bool {
        self.connected
    }

    fn bytes_available(&self) -> usize {
        self.inbound.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> HwResult<()> {
        if !self.connected {
            return Err(Box::new(std::io::Error::other("transport disconnected")));
        }
        self.outbound.push(byte);
        Ok(())
    }
}
