//! Device loop execution: config mapping, simulated hardware assembly,
//! tick pacing and telemetry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;

use glove_core::bank::SENSOR_DISTANCE;
use glove_core::config::ChannelCfg;
use glove_core::conversions::{calibration_overrides, channel_overrides};
use glove_core::util::period_ms;
use glove_core::{Device, VariantSpec};
use glove_hardware::{LoopbackTransport, MemoryStorage, SimInput, TextDisplay};

pub struct RunOpts {
    pub max_ticks: Option<u64>,
    pub echo_display: bool,
    pub telemetry: bool,
}

/// Resolve channel overrides: calibration CSV rows win over `[channels]`
/// tables from the TOML.
pub fn resolve_overrides(
    cfg: &glove_config::Config,
    calibration: Option<&[glove_config::CalibrationRow]>,
) -> eyre::Result<Vec<(u8, ChannelCfg)>> {
    let mut overrides = channel_overrides(cfg).wrap_err("resolve [channels] overrides")?;
    if let Some(rows) = calibration {
        overrides.extend(calibration_overrides(rows).wrap_err("resolve calibration rows")?);
    }
    Ok(overrides)
}

pub fn run(
    cfg: &glove_config::Config,
    overrides: Vec<(u8, ChannelCfg)>,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let variant = VariantSpec::from(cfg.device.variant);
    let input = SimInput::new(variant.sensor_mask);
    let mut transport = LoopbackTransport::new();
    // Sim host: ask for streaming right away, like junXion does after
    // its handshake.
    transport.feed(&[0xFF, 0xFF, 0, b'D']);

    let mut builder = Device::builder()
        .with_input(input)
        .with_display(TextDisplay::new(opts.echo_display))
        .with_storage(MemoryStorage::new())
        .with_transport(transport)
        .with_variant(variant)
        .with_buttons((&cfg.buttons).into())
        .with_protocol((&cfg.protocol).into());
    for (id, ch) in overrides {
        builder = builder.with_channel(id, ch);
    }
    let mut device = builder.try_build()?;

    let period = Duration::from_millis(period_ms(cfg.device.tick_hz));
    tracing::info!(
        variant = variant.name,
        tick_hz = cfg.device.tick_hz,
        "device loop starting"
    );

    let mut ticks: u64 = 0;
    while !shutdown.load(Ordering::Relaxed) {
        let started = Instant::now();
        device.tick();
        ticks += 1;

        // Drain the loopback buffer every tick; nothing reads the sim
        // host side, so it would grow for as long as the loop runs.
        let wire_bytes = device.transport_mut().take_outbound().len();

        if opts.telemetry {
            let line = serde_json::json!({
                "tick": ticks,
                "now_ms": device.now_ms(),
                "stack_depth": device.stack_depth(),
                "fps": device.framerate(),
                "distance": device.sensors().value(SENSOR_DISTANCE),
                "buttons": device.buttons().current_word(),
                "wire_bytes": wire_bytes,
            });
            println!("{line}");
        }

        if opts.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        if let Some(remaining) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    tracing::info!(ticks, "device loop finished");
    Ok(())
}
