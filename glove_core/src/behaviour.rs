//! UI behaviours and the bounded pushdown stack that owns them.
//!
//! A behaviour is one screen/mode of the on-device UI. It never mutates the
//! stack directly; it queues push/pop requests on `Navigation`, and the
//! stack applies them exactly once per tick, strictly after `on_tick`
//! returns. That keeps structural changes out of the middle of a tick.

use glove_traits::{Display, Storage, Transport};

use crate::bank::SensorBank;
use crate::buttons::ButtonBank;
use crate::device::Settings;

/// Maximum stack depth, root included. Pushes beyond this are dropped.
pub const BEHAVIOUR_STACK_CAPACITY: usize = 10;

/// Edge-triggered UI commands derived from the button bank once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Commands {
    pub enter: bool,
    pub up: bool,
    pub down: bool,
    pub menu: bool,
}

/// Everything a behaviour may touch during one tick.
pub struct Ctx<'a> {
    pub now_ms: u64,
    pub commands: Commands,
    pub sensors: &'a SensorBank,
    pub buttons: &'a ButtonBank,
    pub display: &'a mut dyn Display,
    pub storage: &'a mut dyn Storage,
    pub transport: &'a mut dyn Transport,
    pub settings: &'a mut Settings,
    pub nav: &'a mut Navigation,
}

/// One screen/mode of the on-device UI.
pub trait Behaviour {
    /// Called exactly once before the first `on_tick` after this behaviour
    /// becomes the stack top (including when a pop reveals it again).
    fn on_enter(&mut self, _ctx: &mut Ctx<'_>) {}

    /// Called once per device tick while this behaviour is the stack top.
    fn on_tick(&mut self, ctx: &mut Ctx<'_>);
}

enum NavRequest {
    Push(Box<dyn Behaviour>),
    Pop,
}

/// Queue of structural requests collected during a tick.
#[derive(Default)]
pub struct Navigation {
    requests: Vec<NavRequest>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that `behaviour` become the new stack top.
    pub fn push(&mut self, behaviour: Box<dyn Behaviour>) {
        self.requests.push(NavRequest::Push(behaviour));
    }

    /// Request removal of the current stack top.
    pub fn pop(&mut self) {
        self.requests.push(NavRequest::Pop);
    }
}

/// Bounded pushdown automaton of owned behaviours.
///
/// Slot 0 is the root and can never be popped. Requests queued during a
/// tick are reconciled after `on_tick`; if the resting top changed, it is
/// entered once before its next tick.
pub struct BehaviourStack {
    slots: Vec<Box<dyn Behaviour>>,
    capacity: usize,
    needs_enter: bool,
}

impl BehaviourStack {
    pub fn new(capacity: usize, root: Box<dyn Behaviour>) -> Self {
        Self {
            slots: vec![root],
            capacity: capacity.max(1),
            needs_enter: true,
        }
    }

    /// Current depth, root included.
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Run one tick: enter the top if pending, tick it, then apply the
    /// requests it queued.
    pub fn drive(&mut self, ctx: &mut Ctx<'_>) {
        if let Some(top) = self.slots.last_mut() {
            if self.needs_enter {
                top.on_enter(ctx);
                self.needs_enter = false;
            }
            top.on_tick(ctx);
        }
        self.reconcile(&mut ctx.nav.requests);
    }

    fn reconcile(&mut self, requests: &mut Vec<NavRequest>) {
        if requests.is_empty() {
            return;
        }
        let top_before = self.top_ptr();
        for request in requests.drain(..) {
            match request {
                NavRequest::Push(behaviour) => {
                    if self.slots.len() < self.capacity {
                        self.slots.push(behaviour);
                    } else {
                        // Soft limit: a push past capacity is a behaviour
                        // authoring bug, not a runtime fault.
                        tracing::warn!(capacity = self.capacity, "behaviour stack full, push dropped");
                    }
                }
                NavRequest::Pop => {
                    if self.slots.len() > 1 {
                        drop(self.slots.pop());
                    }
                }
            }
        }
        if self.top_ptr() != top_before {
            self.needs_enter = true;
        }
    }

    fn top_ptr(&self) -> *const () {
        self.slots
            .last()
            .map_or(std::ptr::null(), |b| std::ptr::from_ref::<dyn Behaviour>(&**b).cast())
    }
}

/// Wrap-around list cursor composed by menu-style screens.
///
/// Replaces screen inheritance: a screen owns a `Selector` and reacts to
/// the event it reports for this tick's commands.
#[derive(Debug, Clone, Copy)]
pub struct Selector {
    count: usize,
    index: usize,
}

/// What the selector did with this tick's commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    /// Enter was pressed on the given item.
    Activate(usize),
    /// The cursor moved to the given item.
    Moved(usize),
    Idle,
}

impl Selector {
    pub fn new(count: usize) -> Self {
        Self {
            count: count.max(1),
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Place the cursor, clamping to the item range.
    pub fn select(&mut self, index: usize) {
        self.index = index.min(self.count - 1);
    }

    pub fn step(&mut self, commands: &Commands) -> MenuEvent {
        if commands.enter {
            return MenuEvent::Activate(self.index);
        }
        if commands.down {
            self.index = (self.index + 1) % self.count;
            return MenuEvent::Moved(self.index);
        }
        if commands.up {
            self.index = (self.index + self.count - 1) % self.count;
            return MenuEvent::Moved(self.index);
        }
        MenuEvent::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_wraps_both_directions() {
        let mut s = Selector::new(3);
        assert_eq!(s.step(&Commands { up: true, ..Default::default() }), MenuEvent::Moved(2));
        assert_eq!(s.step(&Commands { down: true, ..Default::default() }), MenuEvent::Moved(0));
        assert_eq!(
            s.step(&Commands { enter: true, ..Default::default() }),
            MenuEvent::Activate(0)
        );
    }

    #[test]
    fn selector_select_clamps() {
        let mut s = Selector::new(4);
        s.select(99);
        assert_eq!(s.index(), 3);
    }
}
