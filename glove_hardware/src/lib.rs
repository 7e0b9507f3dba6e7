//! Simulated hardware ports for running the firmware core on a desktop.
//!
//! Real boards implement the same `glove_traits` ports against their HALs;
//! everything here is deterministic so CLI runs and integration tests are
//! reproducible.

pub mod error;

use std::collections::VecDeque;

use glove_traits::{Align, Display, Font, InputSource, Storage, Transport};

use error::HwError;

type PortResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Raw output range a simulated channel sweeps over, mirroring what the
/// real sensors deliver.
fn sim_range(id: u8) -> (f64, f64) {
    match id {
        0..=3 => (0.0, 1023.0),   // flex
        4 => (0.0, 1300.0),       // distance
        5..=7 => (-12.0, 12.0),   // accel
        8 => (-90.0, 90.0),       // gyro roll
        _ => (-180.0, 180.0),     // gyro pitch/heading
    }
}

/// Input source producing triangle waves per sensor and scripted button
/// chords. Each channel gets a distinct period so values stay visibly
/// out of phase.
pub struct SimInput {
    present_mask: u16,
    reads: u64,
    presses: VecDeque<(u32, u16)>,
    orientation_resets: u32,
}

impl SimInput {
    pub fn new(present_mask: u16) -> Self {
        Self {
            present_mask,
            reads: 0,
            presses: VecDeque::new(),
            orientation_resets: 0,
        }
    }

    /// Queue `word` to be held for the next `reads` button reads.
    /// A zero-read entry would never be consumed, so it is ignored.
    pub fn push_press(&mut self, reads: u32, word: u16) {
        if reads > 0 {
            self.presses.push_back((reads, word));
        }
    }

    pub fn orientation_resets(&self) -> u32 {
        self.orientation_resets
    }

    fn triangle(&self, id: u8) -> f64 {
        let period = 80 + 16 * u64::from(id);
        let phase = (self.reads + 7 * u64::from(id)) % period;
        let half = period / 2;
        let frac = if phase < half {
            phase as f64 / half as f64
        } else {
            (period - phase) as f64 / half as f64
        };
        let (lo, hi) = sim_range(id);
        lo + frac * (hi - lo)
    }
}

impl InputSource for SimInput {
    fn read_buttons(&mut self) -> PortResult<u16> {
        self.reads += 1;
        match self.presses.front_mut() {
            Some((remaining, word)) => {
                let word = *word;
                *remaining -= 1;
                if *remaining == 0 {
                    self.presses.pop_front();
                }
                Ok(word)
            }
            None => Ok(0),
        }
    }

    fn read_sensor(&mut self, id: u8) -> PortResult<Option<f64>> {
        if !self.sensor_present(id) {
            return Err(Box::new(HwError::Bus(format!("no sensor {id}"))));
        }
        Ok(Some(self.triangle(id)))
    }

    fn sensor_present(&self, id: u8) -> bool {
        id < 16 && self.present_mask & (1 << id) != 0
    }

    fn reset_orientation(&mut self) -> bool {
        self.orientation_resets += 1;
        tracing::debug!("simulated orientation reset");
        true
    }
}

/// Display that renders each frame as text lines on stdout when `echo`
/// is enabled; otherwise it just keeps the last frame for inspection.
pub struct TextDisplay {
    echo: bool,
    frame: Vec<String>,
    last_frame: Vec<String>,
}

impl TextDisplay {
    pub fn new(echo: bool) -> Self {
        Self {
            echo,
            frame: Vec::new(),
            last_frame: Vec::new(),
        }
    }

    /// Text content of the most recently presented frame.
    pub fn last_frame(&self) -> &[String] {
        &self.last_frame
    }
}

impl Display for TextDisplay {
    fn ready(&self) -> bool {
        true
    }

    fn clear(&mut self) {
        self.frame.clear();
    }

    fn set_font(&mut self, _font: Font) {}

    fn set_align(&mut self, _align: Align) {}

    fn draw_text(&mut self, x: u8, y: u8, text: &str) {
        self.frame.push(format!("({x:3},{y:2}) {text}"));
    }

    fn draw_rect(&mut self, x: u8, y: u8, w: u8, h: u8) {
        self.frame.push(format!("({x:3},{y:2}) rect {w}x{h}"));
    }

    fn fill_rect(&mut self, x: u8, y: u8, w: u8, h: u8) {
        self.frame.push(format!("({x:3},{y:2}) fill {w}x{h}"));
    }

    fn present(&mut self) {
        if self.echo && self.frame != self.last_frame {
            println!("---- display ----");
            for line in &self.frame {
                println!("{line}");
            }
        }
        self.last_frame.clone_from(&self.frame);
    }
}

/// Volatile byte storage standing in for the board's EEPROM; unwritten
/// slots read as 0 like erased flash mapped through the storage layer.
pub struct MemoryStorage {
    bytes: [u8; 256],
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self { bytes: [0; 256] }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read_byte(&mut self, key: u16) -> u8 {
        self.bytes.get(key as usize).copied().unwrap_or(0)
    }

    fn write_byte(&mut self, key: u16, value: u8) {
        if let Some(slot) = self.bytes.get_mut(key as usize) {
            *slot = value;
        } else {
            tracing::warn!(key, "storage write out of range");
        }
    }
}

/// Transport that buffers outbound bytes and lets a driver script
/// inbound traffic, emulating a host connection.
pub struct LoopbackTransport {
    connected: bool,
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self {
            connected: true,
            inbound: VecDeque::new(),
            outbound: Vec::new(),
        }
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Drain everything the device has written so far.
    pub fn take_outbound(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }
}

impl Transport for LoopbackTransport {
    fn connected(&self) -> bool {
        self.connected
    }

    fn bytes_available(&self) -> usize {
        self.inbound.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> PortResult<()> {
        if !self.connected {
            return Err(Box::new(HwError::NotConnected));
        }
        self.outbound.push(byte);
        Ok(())
    }
}
