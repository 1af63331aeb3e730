//! Desktop network services.
//!
//! - `mqtt` feature: [`RumqttClient`](mqtt::RumqttClient), an
//!   [`MqttClient`](crate::traits::MqttClient) on top of `rumqttc`
//! - `portal` feature: [`WebPortal`](portal::WebPortal), a
//!   [`Provisioner`](crate::traits::Provisioner) served by axum
//!
//! Both plug into [`crate::BlindsController`] through a platform type, the
//! same way the ESP32 implementations do.

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "portal")]
pub mod portal;

#[cfg(feature = "mqtt")]
pub use mqtt::*;

#[cfg(feature = "portal")]
pub use portal::*;
