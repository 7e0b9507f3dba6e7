//! End-to-end ticks through the device with mock ports.

use std::sync::Arc;
use std::time::Duration;

use glove_core::bank::{SENSOR_ACCEL_X, SENSOR_DISTANCE};
use glove_core::buttons::{
    BUTTON_INDEX_FINGER_2, BUTTON_LITTLE_FINGER_1, BUTTON_MIDDLE_FINGER_2, BUTTON_THUMB_1,
};
use glove_core::device::{
    STORAGE_INIT, STORAGE_INIT_MARKER, STORAGE_PROTOCOL, STORAGE_SHOW_FRAMERATE,
};
use glove_core::mocks::{MemStorage, PipeTransport, RecordingDisplay, ScriptedInput};
use glove_core::{Device, ProtocolCfg, ProtocolKind, VariantSpec};
use glove_traits::clock::test_clock::TestClock;
use glove_traits::clock::Clock;

type TestDevice = Device<ScriptedInput, RecordingDisplay, MemStorage, PipeTransport>;

fn build(
    input: ScriptedInput,
    storage: MemStorage,
    transport: PipeTransport,
    variant: VariantSpec,
    clock: &TestClock,
) -> TestDevice {
    Device::builder()
        .with_input(input)
        .with_display(RecordingDisplay::new())
        .with_storage(storage)
        .with_transport(transport)
        .with_variant(variant)
        .with_clock(Arc::new(clock.clone()) as Arc<dyn Clock + Send + Sync>)
        .try_build()
        .expect("device builds")
}

fn glove_input(variant: &VariantSpec) -> ScriptedInput {
    ScriptedInput::new(variant.sensor_mask)
}

#[test]
fn boots_into_junxion_by_default() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let mut device = build(
        glove_input(&variant),
        MemStorage::new(),
        PipeTransport::new(),
        variant,
        &clock,
    );

    device.tick(); // home resolves protocol, push applied after the tick
    assert_eq!(device.stack_depth(), 2);

    device.tick(); // junxion announces on its first connected tick
    let out = &device.transport().outbound;
    // junxion id response: header, header, size 2, 'j', 308 big-endian
    assert!(
        out.starts_with(&[0xFF, 0xFF, 2, b'j', 0x01, 0x34]),
        "got {out:?}"
    );
}

#[test]
fn junxion_streams_after_start_data() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let mut transport = PipeTransport::new();
    transport.feed(&[0xFF, 0xFF, 0, b'D']);
    let mut device = build(
        glove_input(&variant),
        MemStorage::new(),
        transport,
        variant,
        &clock,
    );

    device.tick(); // home
    device.tick(); // junxion: announce, consume start-data, first frame
    let before = device.transport().outbound.len();
    device.tick(); // exactly one more data frame
    let frame = &device.transport().outbound[before..];
    assert_eq!(&frame[..2], &[0xFF, 0xFF]);
    assert_eq!(frame[3], b'd');
    // glove: 12 available digital slots pack into 1 word, 11 analog
    // channels plus the state channel follow
    assert_eq!(frame[2], 2 + 2 * 12);
    assert_eq!(frame.len(), 4 + usize::from(frame[2]));
}

#[test]
fn boots_into_max_and_waits_for_host() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let storage = MemStorage::new()
        .preset(STORAGE_INIT, STORAGE_INIT_MARKER)
        .preset(STORAGE_PROTOCOL, 1);
    let mut device = build(
        glove_input(&variant),
        storage,
        PipeTransport::disconnected(),
        variant,
        &clock,
    );

    device.tick(); // home pushes the max adapter
    device.tick();
    assert_eq!(device.stack_depth(), 2);
    assert!(
        device.display().shows("Waiting for"),
        "calls: {:?}",
        device.display().calls
    );
    assert!(device.transport().outbound.is_empty());
}

#[test]
fn configured_default_protocol_seeds_fresh_storage() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let mut device = Device::builder()
        .with_input(ScriptedInput::new(variant.sensor_mask))
        .with_display(RecordingDisplay::new())
        .with_storage(MemStorage::new())
        .with_transport(PipeTransport::new())
        .with_variant(variant)
        .with_protocol(ProtocolCfg {
            default: ProtocolKind::Max,
            board_id: 2,
        })
        .with_clock(Arc::new(clock.clone()) as Arc<dyn Clock + Send + Sync>)
        .try_build()
        .expect("device builds");

    device.tick(); // home resolves the seeded selection
    device.tick(); // max adapter connects and announces
    let out = &device.transport().outbound;
    assert!(
        out.starts_with(&[b'S', b'I', 10, b'G']),
        "expected a Max info frame, got {out:?}"
    );
}

#[test]
fn max_streams_and_tracks_host_state() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let storage = MemStorage::new()
        .preset(STORAGE_INIT, STORAGE_INIT_MARKER)
        .preset(STORAGE_PROTOCOL, 1);
    let mut transport = PipeTransport::new();
    // Host pushes state 7: S S <len> <state> E
    transport.feed(&[b'S', b'S', 4, 7, b'E']);
    let mut device = build(glove_input(&variant), storage, transport, variant, &clock);

    device.tick(); // home pushes the max adapter
    device.tick(); // connect: info frame, then digital + analog
    let out = &device.transport().outbound;
    assert!(
        out.starts_with(&[b'S', b'I', 10, b'G', 5, 3, 0, 0, 0, b'E']),
        "got {out:?}"
    );
    // digital frame: 16 slot bytes; analog frame: 11 big-endian values
    assert_eq!(out[10..13], [b'S', b'D', 20]);
    assert_eq!(out[29], b'E');
    assert_eq!(out[30..33], [b'S', b'A', 26]);
    assert_eq!(out[55], b'E');

    // The receiver consumes one step per tick: start, type, payload.
    device.tick();
    device.tick();
    device.tick();
    assert!(
        device.display().shows("text(64,12): 7"),
        "calls: {:?}",
        device.display().calls
    );
}

#[test]
fn long_press_combo_resets_to_menu() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let mut input = glove_input(&variant);
    // ScriptedInput repeats the last word, so the chord stays held.
    input.push_buttons((1 << BUTTON_THUMB_1) | (1 << BUTTON_LITTLE_FINGER_1));
    let mut device = build(
        input,
        MemStorage::new(),
        PipeTransport::new(),
        variant,
        &clock,
    );

    device.tick(); // home; chord pressed, timer armed
    device.tick(); // junxion entered
    clock.advance(Duration::from_millis(5000));
    device.tick(); // long press latches, stack collapses to menu
    assert_eq!(device.stack_depth(), 2);

    clock.advance(Duration::from_millis(20));
    device.tick(); // menu entered and drawn
    assert!(
        device.display().shows("Menu"),
        "calls: {:?}",
        device.display().calls
    );
}

#[test]
fn recalibrate_chord_resets_orientation() {
    // Only the ball variant populates the second-row finger buttons that
    // form the recalibration chord.
    let clock = TestClock::new();
    let variant = VariantSpec::ball();
    let mut input = ScriptedInput::new(variant.sensor_mask);
    input.push_buttons(0);
    input.push_buttons((1 << BUTTON_INDEX_FINGER_2) | (1 << BUTTON_MIDDLE_FINGER_2));
    let mut device = build(
        input,
        MemStorage::new(),
        PipeTransport::new(),
        variant,
        &clock,
    );

    device.tick();
    assert_eq!(device.input().orientation_resets, 0);
    clock.advance(Duration::from_millis(20));
    device.tick(); // chord edge detected this tick
    assert_eq!(device.input().orientation_resets, 1);
}

#[test]
fn absent_sensors_read_neutral() {
    let clock = TestClock::new();
    let variant = VariantSpec::ball();
    let mut device = build(
        ScriptedInput::new(variant.sensor_mask),
        MemStorage::new(),
        PipeTransport::new(),
        variant,
        &clock,
    );

    device.tick();
    // The ball variant has no distance sensor; its value stays 0 and it
    // never reports activity.
    assert_eq!(device.sensors().value(SENSOR_DISTANCE), 0);
    assert!(!device.sensors().activity(SENSOR_DISTANCE));
    assert!(device.sensors().available(SENSOR_ACCEL_X));
}

#[test]
fn builder_reports_missing_ports() {
    let result = TestDevice::builder()
        .with_display(RecordingDisplay::new())
        .with_storage(MemStorage::new())
        .with_transport(PipeTransport::new())
        .try_build();
    assert!(matches!(
        result.err(),
        Some(glove_core::BuildError::MissingInput)
    ));
}

#[test]
fn framerate_flag_restored_from_storage() {
    let clock = TestClock::new();
    let variant = VariantSpec::glove();
    let storage = MemStorage::new().preset(STORAGE_SHOW_FRAMERATE, 1);
    let device = build(
        glove_input(&variant),
        storage,
        PipeTransport::new(),
        variant,
        &clock,
    );
    assert!(device.settings().show_framerate);
}
