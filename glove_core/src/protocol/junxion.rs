//! Adapter for the junXion mapping host.
//!
//! Frames are `0xFF 0xFF <size> <command> <payload>`. The host polls with
//! single-command requests; once it sends start-data we stream a frame per
//! tick until stop-data arrives.

use glove_traits::{Align, Font, Transport};

use crate::bank::{
    SENSOR_FLEX_INDEX_FINGER, SENSOR_FLEX_LITTLE_FINGER,
};
use crate::behaviour::{Behaviour, Ctx};
use crate::protocol::{self, ANALOG_ORDER, DIGITAL_SLOTS};

pub const HEADER: u8 = 0xFF;
pub const START_DATA: u8 = b'D';
pub const STOP_DATA: u8 = b'S';
pub const DATA_RESPONSE: u8 = b'd';
pub const BOARD_ID_REQUEST: u8 = b'B';
pub const BOARD_ID_RESPONSE: u8 = b'b';
pub const JUNXION_ID_REQUEST: u8 = b'J';
pub const JUNXION_ID_RESPONSE: u8 = b'j';
pub const INPUT_CONFIG_REQUEST: u8 = b'I';
pub const INPUT_CONFIG_RESPONSE: u8 = b'p';

/// Protocol revision reported to the host.
pub const JUNXION_ID: u16 = 308;
/// Identifies as board 3 on the host side.
pub const DEFAULT_BOARD_ID: u8 = 51;

const DIGITAL_INPUT: u8 = b'd';
const ANALOG_INPUT: u8 = b'a';
const OTHER_INPUT: u8 = b'o';
const DIGITAL_RESOLUTION: u8 = 1;
const ANALOG_RESOLUTION: u8 = 16;

const MIN_STATE: u16 = 1;
const MAX_STATE: u16 = 15;

type WireResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct Junxion {
    board_id: u8,
    state: u16,
    send_data: bool,
    header_seen: bool,
    package_size: usize,
    announced: bool,
}

impl Junxion {
    pub fn new(board_id: u8) -> Self {
        Self {
            board_id,
            state: MIN_STATE,
            send_data: false,
            header_seen: false,
            package_size: 0,
            announced: false,
        }
    }

    fn step_state(&mut self, ctx: &Ctx<'_>) {
        if ctx.commands.up {
            self.state = if self.state < MAX_STATE {
                self.state + 1
            } else {
                MIN_STATE
            };
        }
        if ctx.commands.down {
            self.state = if self.state > MIN_STATE {
                self.state - 1
            } else {
                MAX_STATE
            };
        }
    }

    fn receive(&mut self, ctx: &mut Ctx<'_>) {
        if !self.header_seen && ctx.transport.bytes_available() > 2 {
            if ctx.transport.read_byte() == Some(HEADER)
                && ctx.transport.read_byte() == Some(HEADER)
            {
                if let Some(size) = ctx.transport.read_byte() {
                    self.header_seen = true;
                    self.package_size = size as usize;
                }
            }
        }
        if self.header_seen && ctx.transport.bytes_available() > self.package_size {
            if let Some(cmd) = ctx.transport.read_byte() {
                // The size byte counts payload after the command, which
                // carries nothing we act on.
                for _ in 0..self.package_size {
                    ctx.transport.read_byte();
                }
                if let Err(e) = self.handle_command(cmd, ctx) {
                    tracing::warn!(cmd, error = %e, "junxion command reply failed");
                }
            }
            self.header_seen = false;
        }
    }

    fn handle_command(&mut self, cmd: u8, ctx: &mut Ctx<'_>) -> WireResult {
        match cmd {
            START_DATA => self.send_data = true,
            STOP_DATA => self.send_data = false,
            BOARD_ID_REQUEST => {
                send_header(ctx.transport, BOARD_ID_RESPONSE, 1)?;
                ctx.transport.write_byte(self.board_id)?;
            }
            JUNXION_ID_REQUEST => send_junxion_id(ctx.transport)?,
            INPUT_CONFIG_REQUEST => self.send_input_config(ctx)?,
            other => tracing::debug!(cmd = other, "ignoring unknown junxion command"),
        }
        Ok(())
    }

    fn send_input_config(&self, ctx: &mut Ctx<'_>) -> WireResult {
        let digital: Vec<u8> = (0..DIGITAL_SLOTS.len() as u8)
            .filter(|&i| DIGITAL_SLOTS[i as usize].available(ctx.sensors, ctx.buttons))
            .collect();
        let analog: Vec<u8> = ANALOG_ORDER
            .iter()
            .copied()
            .filter(|&id| ctx.sensors.available(id))
            .collect();
        // One extra analog channel carries the UI state.
        let size = 3 * (digital.len() + analog.len() + 1) as u8;
        send_header(ctx.transport, INPUT_CONFIG_RESPONSE, size)?;
        for slot in digital {
            ctx.transport
                .write_all(&[DIGITAL_INPUT, slot, DIGITAL_RESOLUTION])?;
        }
        let mut flex_pin = 0;
        let mut other_pin = 0;
        for id in analog {
            let flex = (SENSOR_FLEX_INDEX_FINGER..=SENSOR_FLEX_LITTLE_FINGER).contains(&id);
            let (kind, pin) = if flex {
                flex_pin += 1;
                (ANALOG_INPUT, flex_pin - 1)
            } else {
                other_pin += 1;
                (OTHER_INPUT, other_pin - 1)
            };
            ctx.transport.write_all(&[kind, pin, ANALOG_RESOLUTION])?;
        }
        ctx.transport
            .write_all(&[OTHER_INPUT, other_pin, ANALOG_RESOLUTION])?;
        Ok(())
    }

    fn send_frame(&self, ctx: &mut Ctx<'_>) -> WireResult {
        let mut snap = protocol::capture(ctx.sensors, ctx.buttons, ctx.now_ms);
        snap.analog.push(self.state * (u16::MAX / MAX_STATE));
        let size = (2 * snap.digital_words.len() + 2 * snap.analog.len()) as u8;
        send_header(ctx.transport, DATA_RESPONSE, size)?;
        for word in snap.digital_words.iter().chain(snap.analog.iter()) {
            ctx.transport.write_all(&word.to_be_bytes())?;
        }
        Ok(())
    }

    fn draw(&self, ctx: &mut Ctx<'_>) {
        ctx.display.set_font(Font::Large);
        ctx.display.set_align(Align::Center);
        ctx.display.draw_text(64, 12, &self.state.to_string());
    }
}

impl Behaviour for Junxion {
    fn on_enter(&mut self, _ctx: &mut Ctx<'_>) {
        self.announced = false;
        self.header_seen = false;
        self.send_data = false;
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if !ctx.transport.connected() {
            ctx.display.set_font(Font::Small);
            ctx.display.set_align(Align::Left);
            ctx.display.draw_text(10, 8, "Connecting");
            ctx.display.draw_text(10, 22, "to junXion...");
            self.announced = false;
            return;
        }
        if !self.announced {
            if let Err(e) =
                send_junxion_id(ctx.transport).and_then(|()| self.send_input_config(ctx))
            {
                tracing::warn!(error = %e, "junxion announce failed");
                return;
            }
            self.announced = true;
        }
        self.step_state(ctx);
        self.receive(ctx);
        if self.send_data {
            if let Err(e) = self.send_frame(ctx) {
                tracing::warn!(error = %e, "junxion data frame failed");
            }
        }
        self.draw(ctx);
    }
}

fn send_header(transport: &mut dyn Transport, cmd: u8, data_size: u8) -> WireResult {
    transport.write_all(&[HEADER, HEADER, data_size, cmd])
}

fn send_junxion_id(transport: &mut dyn Transport) -> WireResult {
    send_header(transport, JUNXION_ID_RESPONSE, 2)?;
    transport.write_all(&JUNXION_ID.to_be_bytes())
}
