//! Stack reconciliation semantics: deferred requests, single on_enter,
//! capacity limit, unpoppable root.

use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use glove_core::behaviour::{Behaviour, BehaviourStack, Commands, Ctx, Navigation};
use glove_core::mocks::{MemStorage, PipeTransport, RecordingDisplay};
use glove_core::{ButtonBank, SensorBank, Settings};

struct Probe {
    enters: Rc<AtomicU32>,
    ticks: Rc<AtomicU32>,
    plan: Vec<Plan>,
}

#[derive(Clone, Copy)]
enum Plan {
    Nothing,
    PushChild,
    Pop,
    PushThenPop,
    PushMany(usize),
    PushManyThenPop(usize, usize),
}

impl Probe {
    fn new(enters: &Rc<AtomicU32>, ticks: &Rc<AtomicU32>) -> Self {
        Self {
            enters: Rc::clone(enters),
            ticks: Rc::clone(ticks),
            plan: Vec::new(),
        }
    }

    fn with_plan(mut self, plan: Vec<Plan>) -> Self {
        self.plan = plan;
        self
    }

    fn child(&self) -> Box<dyn Behaviour> {
        Box::new(Probe::new(&self.enters, &self.ticks).with_plan(Vec::new()))
    }
}

impl Behaviour for Probe {
    fn on_enter(&mut self, _ctx: &mut Ctx<'_>) {
        self.enters.fetch_add(1, Ordering::Relaxed);
    }

    fn on_tick(&mut self, ctx: &mut Ctx<'_>) {
        let step = self.ticks.fetch_add(1, Ordering::Relaxed) as usize;
        match self.plan.get(step).copied().unwrap_or(Plan::Nothing) {
            Plan::Nothing => {}
            Plan::PushChild => ctx.nav.push(self.child()),
            Plan::Pop => ctx.nav.pop(),
            Plan::PushThenPop => {
                ctx.nav.push(self.child());
                ctx.nav.pop();
            }
            Plan::PushMany(n) => {
                for _ in 0..n {
                    ctx.nav.push(self.child());
                }
            }
            Plan::PushManyThenPop(pushes, pops) => {
                for _ in 0..pushes {
                    ctx.nav.push(self.child());
                }
                for _ in 0..pops {
                    ctx.nav.pop();
                }
            }
        }
    }
}

/// Drives `stack` for one tick with throwaway collaborators.
fn drive(stack: &mut BehaviourStack, nav: &mut Navigation) {
    let sensors = SensorBank::new();
    let buttons = ButtonBank::new();
    let mut display = RecordingDisplay::new();
    let mut storage = MemStorage::new();
    let mut transport = PipeTransport::new();
    let mut settings = Settings::default();
    let mut ctx = Ctx {
        now_ms: 0,
        commands: Commands::default(),
        sensors: &sensors,
        buttons: &buttons,
        display: &mut display,
        storage: &mut storage,
        transport: &mut transport,
        settings: &mut settings,
        nav,
    };
    stack.drive(&mut ctx);
}

#[test]
fn push_enters_child_once() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::PushChild]);
    let mut stack = BehaviourStack::new(10, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav); // root enter + tick, push applied after
    assert_eq!(stack.depth(), 2);
    assert_eq!(enters.load(Ordering::Relaxed), 1);

    drive(&mut stack, &mut nav); // child enter + tick
    drive(&mut stack, &mut nav); // child tick only
    assert_eq!(enters.load(Ordering::Relaxed), 2);
}

#[test]
fn push_then_pop_in_same_tick_does_not_reenter_top() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::PushThenPop]);
    let mut stack = BehaviourStack::new(10, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav);
    assert_eq!(stack.depth(), 1);
    drive(&mut stack, &mut nav);
    // Resting top never changed, so only the boot enter happened.
    assert_eq!(enters.load(Ordering::Relaxed), 1);
}

#[test]
fn pop_reveals_and_reenters_parent() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::PushChild]);
    let mut stack = BehaviourStack::new(10, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav); // root pushes child
    drive(&mut stack, &mut nav); // child enter + tick (child plan empty)
    nav.pop(); // external pop request, applied at next drive
    drive(&mut stack, &mut nav);
    assert_eq!(stack.depth(), 1);
    drive(&mut stack, &mut nav);
    // boot enter + child enter + root re-enter after reveal
    assert_eq!(enters.load(Ordering::Relaxed), 3);
}

#[test]
fn root_is_unpoppable() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::Pop, Plan::Pop]);
    let mut stack = BehaviourStack::new(10, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav);
    drive(&mut stack, &mut nav);
    assert_eq!(stack.depth(), 1);
}

#[test]
fn pushes_beyond_capacity_are_dropped() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::PushMany(5)]);
    let mut stack = BehaviourStack::new(3, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav);
    assert_eq!(stack.depth(), 3);
}

#[test]
fn pushes_and_pops_in_one_tick_enter_only_the_survivor() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::PushManyThenPop(3, 2)]);
    let mut stack = BehaviourStack::new(10, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav);
    // Three pushes then two pops in one tick leave only the first child;
    // the two popped behaviours are dropped without ever being entered.
    assert_eq!(stack.depth(), 2);
    assert_eq!(enters.load(Ordering::Relaxed), 1);
    drive(&mut stack, &mut nav);
    assert_eq!(enters.load(Ordering::Relaxed), 2);
}

#[test]
fn queued_requests_apply_in_order() {
    let enters = Rc::new(AtomicU32::new(0));
    let ticks = Rc::new(AtomicU32::new(0));
    let root = Probe::new(&enters, &ticks).with_plan(vec![Plan::PushMany(3)]);
    let mut stack = BehaviourStack::new(10, Box::new(root));
    let mut nav = Navigation::new();

    drive(&mut stack, &mut nav);
    assert_eq!(stack.depth(), 4);
    nav.pop();
    nav.pop();
    drive(&mut stack, &mut nav);
    assert_eq!(stack.depth(), 2);
}
