//! Trait definitions for hardware, storage and network collaborators.
//!
//! This module defines the seams that allow smart-blinds to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Use different MQTT clients and provisioning portals
//! - Keep the command pipeline testable without a servo attached
//!
//! # Submodules
//!
//! - `hardware`: Servo, serial console, setup button, reset detector, clock
//! - `network`: Network status, MQTT client, provisioning portal
//! - `storage`: Flash filesystem
//! - `platform`: Bundles the above into one type parameter

pub mod hardware;
pub mod network;
pub mod platform;
pub mod storage;

pub use hardware::*;
pub use network::*;
pub use platform::*;
pub use storage::*;
