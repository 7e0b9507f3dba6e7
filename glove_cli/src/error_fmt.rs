//! Human-readable error descriptions for common failure modes.

/// Map an eyre::Report to an explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use glove_core::error::{BuildError, DeviceError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingInput => {
                "What happened: No input source was provided to the device builder.\nHow to fix: Pass an input implementation via with_input(...).".to_string()
            }
            BuildError::MissingDisplay => {
                "What happened: No display was provided to the device builder.\nHow to fix: Pass a display implementation via with_display(...).".to_string()
            }
            BuildError::MissingStorage => {
                "What happened: No storage was provided to the device builder.\nHow to fix: Pass a storage implementation via with_storage(...).".to_string()
            }
            BuildError::MissingTransport => {
                "What happened: No transport was provided to the device builder.\nHow to fix: Pass a transport implementation via with_transport(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or calibration CSV.\nHow to fix: Edit the offending file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DeviceError>() {
        if matches!(de, DeviceError::Timeout) {
            return "What happened: A sensor read timed out.\nLikely causes: The sensor bus is wedged or a sensor lost power.\nHow to fix: Check wiring and power, then restart the device.".to_string();
        }
        return format!(
            "What happened: {de}.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv") || lower.contains("csv row") {
        return format!(
            "What happened: The calibration CSV was rejected ({msg}).\nHow to fix: Ensure headers are 'channel,raw_min,raw_max,min_std_dev' and every channel name is known."
        );
    }

    if lower.contains("unknown channel") {
        return format!(
            "What happened: {msg}.\nHow to fix: Use one of the channel names listed in the config documentation."
        );
    }

    msg
}
