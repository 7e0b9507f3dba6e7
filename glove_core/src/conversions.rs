//! Bridges from `glove_config` schema types to core runtime types.
//!
//! These keep the field-by-field mapping out of the CLI.

use crate::bank::SENSOR_COUNT;
use crate::config::{ButtonCfg, ChannelCfg, ProtocolCfg};
use crate::device::VariantSpec;
use crate::error::DeviceError;
use crate::protocol::ProtocolKind;

impl From<&glove_config::ChannelRange> for ChannelCfg {
    fn from(c: &glove_config::ChannelRange) -> Self {
        Self {
            raw_min: c.raw_min,
            raw_max: c.raw_max,
            min_std_dev: c.min_std_dev,
        }
    }
}

impl From<&glove_config::CalibrationRow> for ChannelCfg {
    fn from(c: &glove_config::CalibrationRow) -> Self {
        Self {
            raw_min: c.raw_min,
            raw_max: c.raw_max,
            min_std_dev: c.min_std_dev,
        }
    }
}

impl From<&glove_config::ButtonsCfg> for ButtonCfg {
    fn from(c: &glove_config::ButtonsCfg) -> Self {
        Self {
            long_press_ms: c.long_press_ms,
        }
    }
}

impl From<glove_config::ProtocolName> for ProtocolKind {
    fn from(p: glove_config::ProtocolName) -> Self {
        match p {
            glove_config::ProtocolName::Junxion => Self::Junxion,
            glove_config::ProtocolName::Max => Self::Max,
        }
    }
}

impl From<&glove_config::ProtocolCfg> for ProtocolCfg {
    fn from(c: &glove_config::ProtocolCfg) -> Self {
        Self {
            default: c.default.into(),
            board_id: c.board_id,
        }
    }
}

impl From<glove_config::Variant> for VariantSpec {
    fn from(v: glove_config::Variant) -> Self {
        match v {
            glove_config::Variant::Glove => Self::glove(),
            glove_config::Variant::Ball => Self::ball(),
        }
    }
}

/// Resolve the `[channels]` overrides of a validated config into
/// `(sensor id, channel config)` pairs.
pub fn channel_overrides(
    cfg: &glove_config::Config,
) -> Result<Vec<(u8, ChannelCfg)>, DeviceError> {
    cfg.channels
        .iter()
        .map(|(name, range)| {
            let id = glove_config::channel_id(name)
                .ok_or_else(|| DeviceError::Config(format!("unknown channel {name:?}")))?;
            debug_assert!((id as usize) < SENSOR_COUNT);
            Ok((id, ChannelCfg::from(range)))
        })
        .collect()
}

/// Resolve calibration CSV rows the same way; later rows win at the
/// builder because they are applied in order.
pub fn calibration_overrides(
    rows: &[glove_config::CalibrationRow],
) -> Result<Vec<(u8, ChannelCfg)>, DeviceError> {
    rows.iter()
        .map(|row| {
            let id = glove_config::channel_id(&row.channel)
                .ok_or_else(|| DeviceError::Config(format!("unknown channel {:?}", row.channel)))?;
            Ok((id, ChannelCfg::from(row)))
        })
        .collect()
}
