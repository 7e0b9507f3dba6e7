//! Debounced digital input state with edge tracking and a long-press
//! detector.
//!
//! Mirrors the sensor bank in shape: an availability mask guards every
//! per-id query, and absent ids read as released.

pub const BUTTON_THUMB_1: u8 = 0;
pub const BUTTON_THUMB_2: u8 = 1;
pub const BUTTON_THUMB_3: u8 = 2;
pub const BUTTON_THUMB_4: u8 = 3;
pub const BUTTON_INDEX_FINGER_1: u8 = 4;
pub const BUTTON_MIDDLE_FINGER_1: u8 = 5;
pub const BUTTON_RING_FINGER_1: u8 = 6;
pub const BUTTON_LITTLE_FINGER_1: u8 = 7;
pub const BUTTON_INDEX_FINGER_2: u8 = 8;
pub const BUTTON_MIDDLE_FINGER_2: u8 = 9;
pub const BUTTON_RING_FINGER_2: u8 = 10;
pub const BUTTON_LITTLE_FINGER_2: u8 = 11;

pub const BUTTON_COUNT: usize = 12;

/// Default hold duration before a long press latches.
pub const LONG_PRESS_MS: u64 = 5000;

fn bit(id: u8) -> u16 {
    if (id as usize) < BUTTON_COUNT {
        1 << id
    } else {
        0
    }
}

/// Current and previous raw bit-vectors plus long-press timer state.
#[derive(Debug, Clone)]
pub struct ButtonBank {
    available: u16,
    current: u16,
    last: u16,
    long_press: bool,
    long_press_mask: u16,
    long_press_ms: u64,
    /// 0 means the timer has never been armed.
    long_press_deadline_ms: u64,
}

impl Default for ButtonBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonBank {
    pub fn new() -> Self {
        Self {
            available: 0,
            current: 0,
            last: 0,
            long_press: false,
            long_press_mask: 0,
            long_press_ms: LONG_PRESS_MS,
            long_press_deadline_ms: 0,
        }
    }

    /// Declare which button ids physically exist on this variant.
    pub fn set_available(&mut self, mask: u16) {
        self.available = mask;
    }

    pub fn available(&self, id: u8) -> bool {
        self.available & bit(id) != 0
    }

    /// Configure the combo that must be held continuously to latch a long
    /// press, and for how long.
    pub fn configure_long_press(&mut self, combo: &[u8], duration_ms: u64) {
        self.long_press_mask = combo.iter().fold(0, |m, id| m | bit(*id));
        self.long_press_ms = duration_ms;
        self.long_press_deadline_ms = 0;
    }

    /// Feed the raw button bit-vector for this tick.
    ///
    /// The long-press deadline re-arms whenever the configured combo is not
    /// fully held; reaching it while held yields exactly one latched tick.
    pub fn update(&mut self, now_ms: u64, raw: u16) {
        self.last = self.current;
        self.current = raw & self.available;

        if self.long_press_deadline_ms == 0
            || self.current & self.long_press_mask != self.long_press_mask
        {
            self.long_press_deadline_ms = now_ms + self.long_press_ms;
        }

        if self.long_press_deadline_ms <= now_ms {
            self.long_press = true;
            self.long_press_deadline_ms = now_ms + self.long_press_ms;
        } else {
            self.long_press = false;
        }
    }

    /// Edge: true only on the tick the button went from released to pressed.
    pub fn down(&self, id: u8) -> bool {
        self.pressed(id) && self.last & bit(id) == 0
    }

    /// Level: true while the button is held.
    pub fn pressed(&self, id: u8) -> bool {
        let b = bit(id);
        b != 0 && self.current & b == b
    }

    /// Current masked button word, one bit per pressed button.
    pub fn current_word(&self) -> u16 {
        self.current
    }

    /// True if either button's down-edge coincides with the other being
    /// held, so the chord is detected in either press order.
    pub fn combination(&self, id1: u8, id2: u8) -> bool {
        (self.down(id1) && self.pressed(id2)) || (self.down(id2) && self.pressed(id1))
    }

    /// True for exactly one tick once the combo has been held past the
    /// configured duration.
    pub fn long_press(&self) -> bool {
        self.long_press
    }
}
