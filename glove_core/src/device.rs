//! Device loop: wires the input, display, storage and transport ports to the
//! sensor and button banks and drives the behaviour stack once per tick.

use std::sync::Arc;
use std::time::Instant;

use glove_traits::clock::{Clock, MonotonicClock};
use glove_traits::{Align, Display, Font, InputSource, Storage, Transport};

use crate::bank::{
    SensorBank, SENSOR_ACCEL_X, SENSOR_COUNT, SENSOR_FLEX_INDEX_FINGER,
    SENSOR_FLEX_LITTLE_FINGER,
};
use crate::behaviour::{BehaviourStack, Commands, Ctx, Navigation, BEHAVIOUR_STACK_CAPACITY};
use crate::buttons::{
    ButtonBank, BUTTON_INDEX_FINGER_1, BUTTON_INDEX_FINGER_2, BUTTON_LITTLE_FINGER_1,
    BUTTON_MIDDLE_FINGER_1, BUTTON_MIDDLE_FINGER_2, BUTTON_RING_FINGER_1, BUTTON_THUMB_1,
    BUTTON_THUMB_3, BUTTON_THUMB_4,
};
use crate::config::{default_channels, ButtonCfg, ChannelCfg, ProtocolCfg};
use crate::error::BuildError;
use crate::hw_error::map_hw_error;
use crate::screens::{HomeScreen, MainMenu};

/// Storage slot for the settings-seeded marker. Fresh storage reads 0 for
/// every slot, which is indistinguishable from a stored Junxion selection,
/// so first boot is detected through this marker instead.
pub const STORAGE_INIT: u16 = 1;
/// Value of [`STORAGE_INIT`] once the configured defaults have been seeded.
pub const STORAGE_INIT_MARKER: u8 = 0xA5;
/// Storage slot for the Junxion board id (ASCII digit).
pub const STORAGE_BOARD_ID: u16 = 2;
/// Storage slot for the framerate overlay flag (0/1).
pub const STORAGE_SHOW_FRAMERATE: u16 = 3;
/// Storage slot for the boot protocol selection.
pub const STORAGE_PROTOCOL: u16 = 4;

/// Mutable device state shared with behaviours through [`Ctx`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    /// Draw the frames-per-second counter in the top-left corner.
    pub show_framerate: bool,
    /// True once the IMU delivered at least one sample this tick.
    pub imu_ready: bool,
    /// True once any flex sensor delivered a sample this tick.
    pub flex_ready: bool,
}

/// Hardware variant: which sensors and buttons are populated and which
/// buttons carry the navigation roles.
#[derive(Debug, Clone, Copy)]
pub struct VariantSpec {
    pub name: &'static str,
    pub sensor_mask: u16,
    pub button_mask: u16,
    /// Two-button chord that, held for the long-press duration, resets the
    /// UI to the main menu.
    pub long_press_combo: [u8; 2],
    pub enter_button: u8,
    pub up_button: u8,
    pub down_button: u8,
    /// Held alone past the long-press duration this emits the menu command.
    pub menu_hold_button: u8,
    /// While this is held together with the hold button, the menu timer
    /// keeps re-arming so protocol state stepping stays usable.
    pub menu_guard_button: u8,
    /// Chord that re-zeroes the IMU orientation.
    pub recalibrate_combo: [u8; 2],
}

fn mask_of(ids: &[u8]) -> u16 {
    ids.iter().fold(0u16, |m, id| m | 1 << id)
}

impl VariantSpec {
    /// Full glove: every sensor, thumb buttons plus one button per finger.
    pub fn glove() -> Self {
        Self {
            name: "glove",
            sensor_mask: (1 << SENSOR_COUNT) - 1,
            button_mask: mask_of(&[0, 1, 2, 3, 4, 5, 6, 7]),
            long_press_combo: [BUTTON_THUMB_1, BUTTON_LITTLE_FINGER_1],
            enter_button: BUTTON_THUMB_1,
            up_button: BUTTON_THUMB_4,
            down_button: BUTTON_THUMB_3,
            menu_hold_button: BUTTON_THUMB_1,
            menu_guard_button: BUTTON_LITTLE_FINGER_1,
            recalibrate_combo: [BUTTON_INDEX_FINGER_2, BUTTON_MIDDLE_FINGER_2],
        }
    }

    /// Ball variant: inertial sensors only, no flex strips or distance.
    pub fn ball() -> Self {
        Self {
            name: "ball",
            sensor_mask: mask_of(&[5, 6, 7, 8, 9, 10]),
            button_mask: mask_of(&[
                BUTTON_THUMB_1,
                BUTTON_INDEX_FINGER_1,
                BUTTON_MIDDLE_FINGER_1,
                BUTTON_RING_FINGER_1,
                BUTTON_LITTLE_FINGER_1,
                BUTTON_INDEX_FINGER_2,
                BUTTON_MIDDLE_FINGER_2,
            ]),
            long_press_combo: [BUTTON_THUMB_1, BUTTON_LITTLE_FINGER_1],
            enter_button: BUTTON_THUMB_1,
            up_button: BUTTON_INDEX_FINGER_1,
            down_button: BUTTON_MIDDLE_FINGER_1,
            menu_hold_button: BUTTON_THUMB_1,
            menu_guard_button: BUTTON_LITTLE_FINGER_1,
            recalibrate_combo: [BUTTON_INDEX_FINGER_2, BUTTON_MIDDLE_FINGER_2],
        }
    }
}

/// The device core, generic over its four hardware ports.
pub struct Device<I, D, S, T> {
    input: I,
    display: D,
    storage: S,
    transport: T,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    variant: VariantSpec,
    sensors: SensorBank,
    buttons: ButtonBank,
    stack: BehaviourStack,
    nav: Navigation,
    settings: Settings,
    now_ms: u64,
    menu_deadline_ms: u64,
    long_press_ms: u64,
    frames: u32,
    fps: u32,
    fps_window_start_ms: u64,
}

impl<I, D, S, T> Device<I, D, S, T>
where
    I: InputSource,
    D: Display,
    S: Storage,
    T: Transport,
{
    pub fn builder() -> DeviceBuilder<I, D, S, T> {
        DeviceBuilder::new()
    }

    /// Milliseconds since the device was built, as of the last tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn variant(&self) -> &VariantSpec {
        &self.variant
    }

    pub fn sensors(&self) -> &SensorBank {
        &self.sensors
    }

    pub fn buttons(&self) -> &ButtonBank {
        &self.buttons
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Frames rendered during the last completed one-second window.
    pub fn framerate(&self) -> u32 {
        self.fps
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Run one frame: sample inputs, update banks, drive the behaviour
    /// stack and present the display.
    pub fn tick(&mut self) {
        let now = self.clock.ms_since(self.epoch);
        self.now_ms = now;
        self.sample_buttons(now);
        self.sample_sensors(now);
        self.handle_chords();
        let commands = self.compute_commands(now);
        self.display.clear();
        let mut ctx = Ctx {
            now_ms: now,
            commands,
            sensors: &self.sensors,
            buttons: &self.buttons,
            display: &mut self.display,
            storage: &mut self.storage,
            transport: &mut self.transport,
            settings: &mut self.settings,
            nav: &mut self.nav,
        };
        self.stack.drive(&mut ctx);
        self.update_framerate(now);
        self.display.present();
    }

    fn sample_buttons(&mut self, now: u64) {
        let raw = match self.input.read_buttons() {
            Ok(bits) => bits,
            Err(e) => {
                let mapped = map_hw_error(e.as_ref());
                tracing::warn!(error = %mapped, "button read failed");
                0
            }
        };
        self.buttons.update(now, raw);
    }

    fn sample_sensors(&mut self, now: u64) {
        let mut imu_ready = false;
        let mut flex_ready = false;
        for id in 0..SENSOR_COUNT as u8 {
            if !self.sensors.available(id) || !self.input.sensor_present(id) {
                continue;
            }
            match self.input.read_sensor(id) {
                Ok(Some(raw)) => {
                    self.sensors.add_measurement(now, id, raw);
                    if id >= SENSOR_ACCEL_X {
                        imu_ready = true;
                    }
                    if (SENSOR_FLEX_INDEX_FINGER..=SENSOR_FLEX_LITTLE_FINGER).contains(&id) {
                        flex_ready = true;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let mapped = map_hw_error(e.as_ref());
                    tracing::warn!(sensor = id, error = %mapped, "sensor read failed");
                }
            }
        }
        self.settings.imu_ready = imu_ready;
        self.settings.flex_ready = flex_ready;
    }

    fn handle_chords(&mut self) {
        let [a, b] = self.variant.recalibrate_combo;
        if self.buttons.combination(a, b) && self.input.reset_orientation() {
            tracing::info!("imu orientation reset");
        }
        if self.buttons.long_press() {
            // Collapse everything above the root, then open the menu.
            for _ in 1..self.stack.depth() {
                self.nav.pop();
            }
            self.nav.push(Box::new(MainMenu::new()));
        }
    }

    fn compute_commands(&mut self, now: u64) -> Commands {
        let hold = self.variant.menu_hold_button;
        let guard = self.variant.menu_guard_button;
        let mut menu = false;
        if self.buttons.combination(hold, guard) {
            self.menu_deadline_ms = now + self.long_press_ms;
        }
        if self.buttons.pressed(hold) {
            if now >= self.menu_deadline_ms {
                menu = true;
                self.menu_deadline_ms = now + self.long_press_ms;
            }
        } else {
            self.menu_deadline_ms = now + self.long_press_ms;
        }
        Commands {
            enter: self.buttons.down(self.variant.enter_button),
            up: self.buttons.down(self.variant.up_button),
            down: self.buttons.down(self.variant.down_button),
            menu,
        }
    }

    fn update_framerate(&mut self, now: u64) {
        self.frames += 1;
        if now >= self.fps_window_start_ms + 1000 {
            self.fps = self.frames;
            self.frames = 0;
            self.fps_window_start_ms = now;
        }
        if self.settings.show_framerate {
            self.display.set_font(Font::Small);
            self.display.set_align(Align::Left);
            self.display.draw_text(0, 8, &self.fps.to_string());
        }
    }
}

/// Builder for [`Device`]. All four ports are mandatory.
pub struct DeviceBuilder<I, D, S, T> {
    input: Option<I>,
    display: Option<D>,
    storage: Option<S>,
    transport: Option<T>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    variant: VariantSpec,
    channels: [ChannelCfg; SENSOR_COUNT],
    button_cfg: ButtonCfg,
    protocol: ProtocolCfg,
}

impl<I, D, S, T> Default for DeviceBuilder<I, D, S, T>
where
    I: InputSource,
    D: Display,
    S: Storage,
    T: Transport,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, D, S, T> DeviceBuilder<I, D, S, T>
where
    I: InputSource,
    D: Display,
    S: Storage,
    T: Transport,
{
    pub fn new() -> Self {
        Self {
            input: None,
            display: None,
            storage: None,
            transport: None,
            clock: None,
            variant: VariantSpec::glove(),
            channels: default_channels(),
            button_cfg: ButtonCfg::default(),
            protocol: ProtocolCfg::default(),
        }
    }

    pub fn with_input(mut self, input: I) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_display(mut self, display: D) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_variant(mut self, variant: VariantSpec) -> Self {
        self.variant = variant;
        self
    }

    /// Override the calibration of a single channel.
    pub fn with_channel(mut self, id: u8, cfg: ChannelCfg) -> Self {
        if let Some(slot) = self.channels.get_mut(id as usize) {
            *slot = cfg;
        }
        self
    }

    pub fn with_buttons(mut self, cfg: ButtonCfg) -> Self {
        self.button_cfg = cfg;
        self
    }

    pub fn with_protocol(mut self, cfg: ProtocolCfg) -> Self {
        self.protocol = cfg;
        self
    }

    pub fn try_build(self) -> Result<Device<I, D, S, T>, BuildError> {
        let input = self.input.ok_or(BuildError::MissingInput)?;
        let display = self.display.ok_or(BuildError::MissingDisplay)?;
        let mut storage = self.storage.ok_or(BuildError::MissingStorage)?;
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::default()));
        let epoch = clock.now();

        let mut sensors = SensorBank::new();
        sensors.set_available(self.variant.sensor_mask);
        for id in 0..SENSOR_COUNT as u8 {
            if !sensors.available(id) {
                continue;
            }
            let cfg = self.channels[id as usize];
            sensors
                .configure(id, cfg.raw_min, cfg.raw_max, cfg.min_std_dev)
                .map_err(|_| BuildError::InvalidConfig("channel range must have non-zero span"))?;
        }

        let mut buttons = ButtonBank::new();
        buttons.set_available(self.variant.button_mask);
        buttons.configure_long_press(&self.variant.long_press_combo, self.button_cfg.long_press_ms);

        let settings = Settings {
            show_framerate: storage.read_byte(STORAGE_SHOW_FRAMERATE) == 1,
            ..Settings::default()
        };

        // First boot: seed the persistent slots from the configured
        // defaults, then set the marker so later boots keep user edits.
        if storage.read_byte(STORAGE_INIT) != STORAGE_INIT_MARKER {
            storage.write_byte(STORAGE_PROTOCOL, self.protocol.default.as_byte());
            storage.write_byte(STORAGE_BOARD_ID, b'0' + self.protocol.board_id.clamp(1, 4));
            storage.write_byte(STORAGE_INIT, STORAGE_INIT_MARKER);
        }
        if !(b'1'..=b'4').contains(&storage.read_byte(STORAGE_BOARD_ID)) {
            storage.write_byte(STORAGE_BOARD_ID, b'0' + self.protocol.board_id.clamp(1, 4));
        }

        Ok(Device {
            input,
            display,
            storage,
            transport,
            clock,
            epoch,
            variant: self.variant,
            sensors,
            buttons,
            stack: BehaviourStack::new(BEHAVIOUR_STACK_CAPACITY, Box::new(HomeScreen::new())),
            nav: Navigation::default(),
            settings,
            now_ms: 0,
            menu_deadline_ms: self.button_cfg.long_press_ms,
            long_press_ms: self.button_cfg.long_press_ms,
            frames: 0,
            fps: 0,
            fps_window_start_ms: 0,
        })
    }
}
