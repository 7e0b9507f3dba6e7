//! Adapter for the Max/MSP patch.
//!
//! Outbound frames are `S <type> <len> <payload> E`. Every tick sends one
//! digital frame (all 16 slots as 0/1 bytes) and one analog frame (all 11
//! channels big-endian). The patch answers with state frames `S S <len>
//! <state> E`.

use glove_traits::{Align, Font, Transport};

use crate::behaviour::{Behaviour, Ctx};
use crate::protocol::{ANALOG_ORDER, DIGITAL_SLOTS};
use crate::screens::MainMenu;
use crate::{VERSION_MAJOR, VERSION_MINOR};

/// Probing the link is expensive on real hardware, so it is rate limited.
pub const SERIAL_CHECK_INTERVAL_MS: u64 = 500;

const FRAME_START: u8 = b'S';
const FRAME_END: u8 = b'E';
const TYPE_DIGITAL: u8 = b'D';
const TYPE_ANALOG: u8 = b'A';
const TYPE_STATE: u8 = b'S';
const TYPE_INFO: u8 = b'I';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receive {
    Idle,
    Header,
    Payload,
}

type WireResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub struct MaxMsp {
    receive: Receive,
    connected: bool,
    serial_check_ms: u64,
    state: u8,
}

impl Default for MaxMsp {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxMsp {
    pub fn new() -> Self {
        Self {
            receive: Receive::Idle,
            connected: false,
            serial_check_ms: 0,
            state: 0,
        }
    }

    /// State most recently pushed by the patch.
    pub fn state(&self) -> u8 {
        self.state
    }

    fn check_connection(&mut self, ctx: &mut Ctx<'_>) {
        if self.serial_check_ms <= ctx.now_ms {
            let was = self.connected;
            self.connected = ctx.transport.connected();
            if self.connected && !was {
                if let Err(e) = self.send_information(ctx.transport) {
                    tracing::warn!(error = %e, "max info frame failed");
                }
            }
            self.serial_check_ms = ctx.now_ms + SERIAL_CHECK_INTERVAL_MS;
        }
    }

    fn receive(&mut self, ctx: &mut Ctx<'_>) {
        match self.receive {
            Receive::Idle => {
                if ctx.transport.bytes_available() > 0
                    && ctx.transport.read_byte() == Some(FRAME_START)
                {
                    self.receive = Receive::Header;
                }
            }
            Receive::Header => {
                if ctx.transport.bytes_available() > 0 {
                    self.receive = if ctx.transport.read_byte() == Some(TYPE_STATE) {
                        Receive::Payload
                    } else {
                        Receive::Idle
                    };
                }
            }
            Receive::Payload => {
                // length, state, terminator
                if ctx.transport.bytes_available() >= 3 {
                    ctx.transport.read_byte();
                    if let Some(state) = ctx.transport.read_byte() {
                        self.state = state;
                    }
                    ctx.transport.read_byte();
                    self.receive = Receive::Idle;
                }
            }
        }
    }

    fn send_digital(&self, ctx: &mut Ctx<'_>) -> WireResult {
        let mut frame = Vec::with_capacity(4 + DIGITAL_SLOTS.len());
        frame.extend_from_slice(&[FRAME_START, TYPE_DIGITAL, 4 + DIGITAL_SLOTS.len() as u8]);
        for slot in &DIGITAL_SLOTS {
            let on = slot.available(ctx.sensors, ctx.buttons)
                && slot.active(ctx.sensors, ctx.buttons, ctx.now_ms);
            frame.push(u8::from(on));
        }
        frame.push(FRAME_END);
        ctx.transport.write_all(&frame)
    }

    fn send_analog(&self, ctx: &mut Ctx<'_>) -> WireResult {
        let mut frame = Vec::with_capacity(4 + 2 * ANALOG_ORDER.len());
        frame.extend_from_slice(&[FRAME_START, TYPE_ANALOG, 4 + 2 * ANALOG_ORDER.len() as u8]);
        for &id in &ANALOG_ORDER {
            frame.extend_from_slice(&ctx.sensors.value(id).to_be_bytes());
        }
        frame.push(FRAME_END);
        ctx.transport.write_all(&frame)
    }

    fn send_information(&self, transport: &mut dyn Transport) -> WireResult {
        transport.write_all(&[
            FRAME_START,
            TYPE_INFO,
            10,
            b'G',
            VERSION_MAJOR,
            VERSION_MINOR,
            0,
            0,
            0,
            FRAME_END,
        ])
    }

    fn draw(&self, ctx: &mut Ctx<'_>) {
        ctx.display.set_font(Font::Large);
        ctx.display.set_align(Align::Center);
        ctx.display.draw_text(64, 12, &self.state.to_string());
    }
}

impl Behaviour for MaxMsp {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        ctx.display.set_align(Align::Left);
        ctx.display.set_font(Font::Small);
        self.receive = Receive::Idle;
        self.serial_check_ms = 0;
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.commands.menu {
            ctx.nav.pop();
            ctx.nav.push(Box::new(MainMenu::new()));
            return;
        }
        self.check_connection(ctx);
        if !self.connected {
            ctx.display.set_font(Font::Small);
            ctx.display.set_align(Align::Left);
            ctx.display.draw_text(10, 8, "Waiting for");
            ctx.display.draw_text(10, 22, "Max connection...");
            return;
        }
        self.draw(ctx);
        self.receive(ctx);
        if let Err(e) = self
            .send_digital(ctx)
            .and_then(|()| self.send_analog(ctx))
        {
            tracing::warn!(error = %e, "max data frames failed");
        }
    }
}
