#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core logic of the smart glove/ball input device (hardware-agnostic).
//!
//! All hardware interactions go through the port traits in `glove_traits`
//! (`InputSource`, `Display`, `Storage`, `Transport`); this crate contains
//! the per-tick pipeline that consumes them.
//!
//! ## Architecture
//!
//! - **Channels**: per-sensor streaming filter and gesture detector
//!   (`channel` module)
//! - **Banks**: fixed collections of channels/buttons with availability
//!   masks (`bank`, `buttons` modules)
//! - **Behaviours**: UI screens over a bounded pushdown stack (`behaviour`,
//!   `screens` modules)
//! - **Protocols**: Junxion and Max telemetry framers (`protocol` module)
//! - **Device**: the tick orchestrator and its builder (`device` module)
//!
//! ## Fixed-point scaling
//!
//! Channel samples are scaled once into the u16 output domain (0..=65535)
//! on insertion; every downstream consumer (screens, protocol adapters)
//! works in that single unit.

pub mod bank;
pub mod behaviour;
pub mod buttons;
pub mod channel;
pub mod config;
pub mod conversions;
pub mod device;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod protocol;
pub mod screens;
pub mod util;

pub use bank::{GestureId, SensorBank};
pub use behaviour::{Behaviour, BehaviourStack, Commands, Ctx, Navigation, Selector};
pub use buttons::ButtonBank;
pub use channel::{GestureDirection, SensorChannel};
pub use config::{ButtonCfg, ChannelCfg, ProtocolCfg};
pub use device::{Device, DeviceBuilder, Settings, VariantSpec};
pub use error::{BuildError, DeviceError, Result};
pub use protocol::ProtocolKind;

/// Firmware version reported on screen and over the wire.
pub const VERSION: &str = "v5.3";
pub const VERSION_MAJOR: u8 = 5;
pub const VERSION_MINOR: u8 = 3;
