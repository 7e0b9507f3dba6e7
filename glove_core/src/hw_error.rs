//! Maps `Box<dyn Error>` from trait boundaries to typed `DeviceError`.
//!
//! The port traits in `glove_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `glove_hardware::HwError`
//! downcasting.

use crate::error::DeviceError;

/// Map a trait-boundary error to a typed `DeviceError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DeviceError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<glove_hardware::error::HwError>() {
            return match hw {
                glove_hardware::error::HwError::Timeout => DeviceError::Timeout,
                glove_hardware::error::HwError::NotConnected => {
                    DeviceError::Transport(hw.to_string())
                }
                other => DeviceError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DeviceError::Timeout
    } else {
        DeviceError::Hardware(s)
    }
}
