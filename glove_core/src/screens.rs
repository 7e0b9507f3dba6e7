//! Concrete UI screens.
//!
//! `HomeScreen` is the permanent stack root; everything else is pushed on
//! top of it. Menu-style screens compose a [`Selector`] instead of sharing
//! a base class.

use glove_traits::{Align, Font};

use crate::bank::{
    GestureId, SENSOR_ACCEL_Y, SENSOR_ACCEL_Z, SENSOR_DISTANCE, SENSOR_FLEX_INDEX_FINGER,
    SENSOR_FLEX_LITTLE_FINGER, SENSOR_FLEX_MIDDLE_FINGER, SENSOR_FLEX_RING_FINGER,
    SENSOR_GYRO_HEADING, SENSOR_GYRO_PITCH, SENSOR_GYRO_ROLL,
};
use crate::behaviour::{Behaviour, Ctx, MenuEvent, Selector};
use crate::buttons::BUTTON_COUNT;
use crate::device::{STORAGE_BOARD_ID, STORAGE_PROTOCOL, STORAGE_SHOW_FRAMERATE};
use crate::protocol::{junxion, Junxion, MaxMsp, ProtocolKind};
use crate::VERSION;

/// Width of the horizontal test bars in pixels.
const BAR_RANGE: u16 = 116;
/// 65535 / BAR_RANGE, maps a scaled sensor value onto the bar.
const BAR_DIVISOR: u16 = 565;

fn small_left(ctx: &mut Ctx<'_>) {
    ctx.display.set_font(Font::Small);
    ctx.display.set_align(Align::Left);
}

/// Draws a sensor value as a bar that fills from the midpoint, with an `A`
/// marker while the channel registers activity.
fn draw_centered_bar(ctx: &mut Ctx<'_>, id: u8) {
    if ctx.sensors.activity(id) {
        ctx.display.draw_text(90, 8, "A");
    }
    ctx.display.draw_rect(10, 22, BAR_RANGE as u8, 8);
    let val = (ctx.sensors.value(id) / BAR_DIVISOR) as u8;
    let mid = (BAR_RANGE / 2) as u8;
    if val < mid {
        ctx.display.fill_rect(10 + val, 22, mid - val, 8);
    } else {
        ctx.display.fill_rect(10 + mid, 22, val - mid, 8);
    }
}

/// Stack root. Resolves the stored protocol selection and pushes the
/// matching adapter whenever it surfaces.
pub struct HomeScreen;

impl HomeScreen {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HomeScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Behaviour for HomeScreen {
    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        match ProtocolKind::from_byte(ctx.storage.read_byte(STORAGE_PROTOCOL)) {
            Some(ProtocolKind::Junxion) => {
                let stored = ctx.storage.read_byte(STORAGE_BOARD_ID);
                let board_id = if (b'1'..=b'4').contains(&stored) {
                    stored
                } else {
                    junxion::DEFAULT_BOARD_ID
                };
                ctx.nav.push(Box::new(Junxion::new(board_id)));
            }
            Some(ProtocolKind::Max) => ctx.nav.push(Box::new(MaxMsp::new())),
            None => {
                ctx.storage
                    .write_byte(STORAGE_PROTOCOL, ProtocolKind::Junxion.as_byte());
            }
        }
    }
}

pub struct MainMenu {
    selector: Selector,
}

impl MainMenu {
    const ITEMS: [&'static str; 9] = [
        "Protocol",
        "junXion Board ID",
        "Button Test",
        "Distance Test",
        "Gesture Test",
        "Gyroscope Test",
        "Flex Test",
        "Show Framerate",
        "Exit",
    ];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Default for MainMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl Behaviour for MainMenu {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(item) = self.selector.step(&ctx.commands) {
            match item {
                0 => ctx.nav.push(Box::new(ProtocolSelect::new())),
                1 => ctx.nav.push(Box::new(BoardIdSelect::new())),
                2 => ctx.nav.push(Box::new(ButtonTest::new())),
                3 => ctx.nav.push(Box::new(DistanceTest::new())),
                4 => ctx.nav.push(Box::new(GestureTest::new())),
                5 => ctx.nav.push(Box::new(GyroscopeTest::new())),
                6 => ctx.nav.push(Box::new(FlexTest::new())),
                7 => ctx.nav.push(Box::new(FramerateOption::new())),
                _ => ctx.nav.pop(),
            }
            return;
        }
        ctx.display.draw_text(10, 8, "Menu");
        ctx.display.draw_text(10, 20, Self::ITEMS[self.selector.index()]);
        ctx.display.set_align(Align::Right);
        ctx.display.draw_text(120, 8, VERSION);
        ctx.display.set_align(Align::Left);
    }
}

pub struct ProtocolSelect {
    selector: Selector,
}

impl ProtocolSelect {
    const ITEMS: [&'static str; 2] = ["junXion", "Max"];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Behaviour for ProtocolSelect {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
        self.selector
            .select(ctx.storage.read_byte(STORAGE_PROTOCOL) as usize);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(item) = self.selector.step(&ctx.commands) {
            ctx.storage.write_byte(STORAGE_PROTOCOL, item as u8);
            ctx.nav.pop();
            return;
        }
        ctx.display.draw_text(10, 8, "Protocol");
        ctx.display.draw_text(10, 20, Self::ITEMS[self.selector.index()]);
    }
}

pub struct BoardIdSelect {
    selector: Selector,
}

impl BoardIdSelect {
    const ITEMS: [&'static str; 4] = ["ID:1", "ID:2", "ID:3", "ID:4"];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Behaviour for BoardIdSelect {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
        // Stored as an ASCII digit.
        let stored = ctx.storage.read_byte(STORAGE_BOARD_ID);
        self.selector
            .select(stored.saturating_sub(b'1') as usize);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(item) = self.selector.step(&ctx.commands) {
            ctx.storage.write_byte(STORAGE_BOARD_ID, b'1' + item as u8);
            ctx.nav.pop();
            return;
        }
        ctx.display.draw_text(10, 8, "junXion Board ID");
        ctx.display.draw_text(10, 20, Self::ITEMS[self.selector.index()]);
    }
}

pub struct ButtonTest;

impl ButtonTest {
    pub fn new() -> Self {
        Self
    }
}

impl Behaviour for ButtonTest {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.commands.menu {
            ctx.nav.pop();
            return;
        }
        ctx.display.draw_text(10, 8, "Button Test");
        let mut x = 10u8;
        for id in 0..BUTTON_COUNT as u8 {
            if ctx.buttons.available(id) {
                ctx.display.draw_rect(x, 22, 7, 10);
            }
            if ctx.buttons.pressed(id) {
                ctx.display.fill_rect(x, 22, 7, 10);
            }
            x += 9;
            if id % 4 == 3 {
                x += 2;
            }
        }
    }
}

pub struct DistanceTest;

impl DistanceTest {
    pub fn new() -> Self {
        Self
    }
}

impl Behaviour for DistanceTest {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if ctx.commands.enter {
            ctx.nav.pop();
            return;
        }
        ctx.display.draw_text(10, 8, "Distance Test");
        ctx.display.draw_rect(10, 22, BAR_RANGE as u8, 8);
        let val = (ctx.sensors.value(SENSOR_DISTANCE) / BAR_DIVISOR) as u8;
        ctx.display.fill_rect(10, 22, val, 8);
    }
}

pub struct FlexTest {
    selector: Selector,
}

impl FlexTest {
    const ITEMS: [&'static str; 4] = [
        "Index Finger",
        "Middle Finger",
        "Ring Finger",
        "Little Finger",
    ];
    const MAP: [u8; 4] = [
        SENSOR_FLEX_INDEX_FINGER,
        SENSOR_FLEX_MIDDLE_FINGER,
        SENSOR_FLEX_RING_FINGER,
        SENSOR_FLEX_LITTLE_FINGER,
    ];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Behaviour for FlexTest {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(_) = self.selector.step(&ctx.commands) {
            ctx.nav.pop();
            return;
        }
        let item = self.selector.index();
        ctx.display.draw_text(10, 8, Self::ITEMS[item]);
        if ctx.settings.flex_ready {
            draw_centered_bar(ctx, Self::MAP[item]);
        } else {
            ctx.display.draw_text(10, 22, "Flex not ready");
        }
    }
}

pub struct GyroscopeTest {
    selector: Selector,
}

impl GyroscopeTest {
    const ITEMS: [&'static str; 3] = ["Heading", "Pitch", "Roll"];
    const MAP: [u8; 3] = [SENSOR_GYRO_HEADING, SENSOR_GYRO_PITCH, SENSOR_GYRO_ROLL];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Behaviour for GyroscopeTest {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(_) = self.selector.step(&ctx.commands) {
            ctx.nav.pop();
            return;
        }
        let item = self.selector.index();
        ctx.display.draw_text(10, 8, Self::ITEMS[item]);
        if ctx.settings.imu_ready {
            draw_centered_bar(ctx, Self::MAP[item]);
        } else {
            ctx.display.draw_text(10, 22, "IMU not ready");
        }
    }
}

pub struct GestureTest {
    selector: Selector,
}

impl GestureTest {
    const ITEMS: [&'static str; 3] = ["Gesture", "Left/Right", "Up/Down"];
    const MAP: [u8; 3] = [0, SENSOR_ACCEL_Y, SENSOR_ACCEL_Z];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Behaviour for GestureTest {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(_) = self.selector.step(&ctx.commands) {
            ctx.nav.pop();
            return;
        }
        let item = self.selector.index();
        ctx.display.draw_text(10, 8, Self::ITEMS[item]);
        if !ctx.settings.imu_ready {
            ctx.display.draw_text(10, 22, "IMU not ready");
            return;
        }
        if item == 0 {
            for (x, gesture) in [
                (10, GestureId::WaveLeft),
                (30, GestureId::WaveRight),
                (50, GestureId::WaveUp),
                (70, GestureId::WaveDown),
            ] {
                if ctx.sensors.gesture_detected(gesture, ctx.now_ms) {
                    ctx.display.draw_text(x, 20, gesture.label());
                }
            }
        } else {
            let id = Self::MAP[item];
            ctx.display
                .draw_text(10, 20, &ctx.sensors.min_value(id).to_string());
            ctx.display
                .draw_text(70, 20, &ctx.sensors.max_value(id).to_string());
        }
    }
}

pub struct FramerateOption {
    selector: Selector,
}

impl FramerateOption {
    const ITEMS: [&'static str; 2] = ["No", "Yes"];

    pub fn new() -> Self {
        Self {
            selector: Selector::new(Self::ITEMS.len()),
        }
    }
}

impl Behaviour for FramerateOption {
    fn on_enter(&mut self, ctx: &mut Ctx<'_>) {
        small_left(ctx);
        self.selector
            .select(usize::from(ctx.settings.show_framerate));
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        if let MenuEvent::Activate(item) = self.selector.step(&ctx.commands) {
            ctx.settings.show_framerate = item == 1;
            ctx.storage.write_byte(STORAGE_SHOW_FRAMERATE, item as u8);
            ctx.nav.pop();
            return;
        }
        ctx.display.draw_text(10, 8, "Show Framerate");
        ctx.display.draw_text(10, 20, Self::ITEMS[self.selector.index()]);
    }
}
