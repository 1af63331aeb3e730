//! Network abstraction traits for the broker session and provisioning.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`NetworkLink`] | "Is the network up" plus a device identity |
//! | [`MqttClient`] | Pub/sub messaging with the automation hub |
//! | [`Provisioner`] | Local setup portal that collects device settings |
//!
//! # Topics
//!
//! With the default topic base `blinds` and device name `Kitchen`:
//!
//! ```text
//! blinds/Kitchen/move                    - Openness command (subscribe)
//! blinds/Kitchen/state                   - ON/OFF (publish)
//! blinds/Kitchen/brightness              - Current openness (publish)
//! homeassistant/light/Kitchen/config     - Discovery record (publish)
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::settings::{DeviceSettings, ProvisioningParams};

// ============================================================================
// Network Link
// ============================================================================

/// Network layer status, as reported by the WiFi/provisioning stack.
pub trait NetworkLink {
    /// Whether the device currently has a usable network connection.
    fn is_up(&self) -> bool;

    /// Stable identity for this device (MAC address or hostname).
    fn identity(&self) -> &str;
}

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32 (blocking I/O)
/// and desktop (a background thread pumps the connection).
///
/// # Implementation Notes
///
/// - `connect` starts a connection attempt and returns without waiting for it
/// - `publish` and `subscribe` are synchronous
/// - `try_recv` is non-blocking for polling patterns
/// - subscriptions are not expected to survive a reconnect; the session
///   state machine resubscribes every time the link comes back
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error: core::fmt::Debug;

    /// Request a connection attempt.
    ///
    /// Clients whose transport reconnects on its own may treat this as a
    /// no-op. An `Err` means the attempt could not even be started.
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Publish a message to a topic.
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
///
/// Contains the topic and payload of a published message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Returns the payload as a UTF-8 string, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}

// ============================================================================
// Provisioning
// ============================================================================

/// Local configuration portal.
///
/// The portal is opened pre-filled with the current settings and hands back
/// the submitted form exactly once through [`Provisioner::poll`].
pub trait Provisioner {
    /// Error type for portal operations.
    type Error: core::fmt::Debug;

    /// Open the portal, pre-filling the form from `current`.
    fn open(&mut self, current: &DeviceSettings) -> Result<(), Self::Error>;

    /// Close the portal. Safe to call when already closed.
    fn close(&mut self);

    /// Whether the portal is currently accepting submissions.
    fn is_open(&self) -> bool;

    /// Housekeeping; returns the submitted parameters once.
    fn poll(&mut self) -> Option<ProvisioningParams>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mqtt_message_payload_str() {
        let msg = MqttMessage::new("blinds/Kitchen/move", b"128".to_vec());
        assert_eq!(msg.payload_str(), Some("128"));

        let bad = MqttMessage::new("blinds/Kitchen/move", vec![0xff, 0xfe]);
        assert_eq!(bad.payload_str(), None);
    }
}
