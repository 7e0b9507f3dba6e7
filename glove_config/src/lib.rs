#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration parsing for the glove firmware.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and channel names so a
//!   stale or hand-edited file fails loudly instead of mis-scaling sensors.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Channel names accepted in `[channels]` tables and calibration CSVs,
/// in sensor id order.
pub const CHANNEL_NAMES: [&str; 11] = [
    "flex_index",
    "flex_middle",
    "flex_ring",
    "flex_little",
    "distance",
    "accel_x",
    "accel_y",
    "accel_z",
    "gyro_roll",
    "gyro_pitch",
    "gyro_heading",
];

/// Sensor id for a channel name, if known.
pub fn channel_id(name: &str) -> Option<u8> {
    CHANNEL_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|i| i as u8)
}

/// Calibration CSV schema.
///
/// Expected headers:
/// channel,raw_min,raw_max,min_std_dev
///
/// Example:
/// channel,raw_min,raw_max,min_std_dev
/// flex_index,12.0,987.0,2.0
/// distance,0.0,1300.0,5.0
#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationRow {
    pub channel: String,
    pub raw_min: f64,
    pub raw_max: f64,
    pub min_std_dev: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Glove,
    Ball,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    pub variant: Variant,
    /// Main loop rate. The stock firmware runs at 50 Hz.
    pub tick_hz: u32,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            variant: Variant::Glove,
            tick_hz: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ButtonsCfg {
    /// Hold duration for the reset-to-menu chord (ms).
    pub long_press_ms: u64,
}

impl Default for ButtonsCfg {
    fn default() -> Self {
        Self {
            long_press_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolName {
    #[default]
    Junxion,
    Max,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProtocolCfg {
    /// Protocol to boot into when storage has never been written.
    pub default: ProtocolName,
    /// junXion board id, 1 through 4.
    pub board_id: u8,
}

impl Default for ProtocolCfg {
    fn default() -> Self {
        Self {
            default: ProtocolName::Junxion,
            board_id: 3,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Raw range and activity threshold override for one channel.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ChannelRange {
    pub raw_min: f64,
    pub raw_max: f64,
    #[serde(default)]
    pub min_std_dev: f64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceCfg,
    pub buttons: ButtonsCfg,
    pub protocol: ProtocolCfg,
    pub logging: Logging,
    /// Per-channel calibration overrides, keyed by [`CHANNEL_NAMES`].
    pub channels: BTreeMap<String, ChannelRange>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.device.tick_hz == 0 {
            eyre::bail!("device.tick_hz must be > 0");
        }
        if self.device.tick_hz > 1000 {
            eyre::bail!("device.tick_hz is unreasonably high (>1000)");
        }
        if self.buttons.long_press_ms == 0 {
            eyre::bail!("buttons.long_press_ms must be >= 1");
        }
        if !(1..=4).contains(&self.protocol.board_id) {
            eyre::bail!(
                "protocol.board_id must be in 1..=4, got {}",
                self.protocol.board_id
            );
        }
        for (name, range) in &self.channels {
            validate_channel(name, range.raw_min, range.raw_max, range.min_std_dev)?;
        }
        Ok(())
    }
}

fn validate_channel(name: &str, raw_min: f64, raw_max: f64, min_std_dev: f64) -> eyre::Result<()> {
    if channel_id(name).is_none() {
        eyre::bail!(
            "unknown channel {:?}; expected one of: {}",
            name,
            CHANNEL_NAMES.join(",")
        );
    }
    if !raw_min.is_finite() || !raw_max.is_finite() {
        eyre::bail!("channel {name}: raw range must be finite");
    }
    if raw_min == raw_max {
        eyre::bail!("channel {name}: raw range must have non-zero span");
    }
    if !min_std_dev.is_finite() || min_std_dev < 0.0 {
        eyre::bail!("channel {name}: min_std_dev must be finite and >= 0");
    }
    Ok(())
}

/// Load per-channel calibration rows, enforcing exact headers and known
/// channel names. Later rows for the same channel win.
pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Vec<CalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["channel", "raw_min", "raw_max", "min_std_dev"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'channel,raw_min,raw_max,min_std_dev', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => {
                validate_channel(&row.channel, row.raw_min, row.raw_max, row.min_std_dev)
                    .map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}
