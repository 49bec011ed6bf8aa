//! Control core of the tile sorter.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`comm`] | Interrupt-fed receive ring buffer |
//! | [`protocol`] | Inbound line protocol (`CFG:`, `Start`, `Stop`) |
//! | [`modem`] | AT command sequencer for the WiFi modem |
//! | [`sensor`] | VEML3328 bus access and sample averaging |
//! | [`color`] | Threshold classifier |
//! | [`sides`] | Per-color side assignment |
//! | [`servo`] | Arm positioning |
//! | [`indicator`] | WS2812 status LED and illumination lamp |
//! | [`control`] | The sorter loop |
//!
//! Peripherals are reached through traits so everything here runs on the host
//! under `cargo test`; the ESP32-C3 board glue lives in the `firmware` binary.

#![cfg_attr(not(test), no_std)]

pub mod color;
pub mod comm;
pub mod config;
pub mod control;
pub mod error;
pub mod indicator;
pub mod modem;
pub mod protocol;
pub mod sensor;
pub mod servo;
pub mod sides;

pub use config::Config;
pub use control::{RunState, Sorter};
pub use error::SorterError;

#[cfg(test)]
pub(crate) mod mock;
