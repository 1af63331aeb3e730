//! Home Assistant MQTT discovery.
//!
//! The blind presents itself as a dimmable light: brightness is openness,
//! `ON` opens fully and `OFF` closes. Home Assistant drops discovered
//! entities when the broker restarts, so the record is published again
//! after every successful (re)connection. Publishing the same record twice
//! is harmless.

extern crate alloc;
use alloc::string::{String, ToString};

use log::info;
use serde::Serialize;

use crate::config::MqttConfig;
use crate::settings::DeviceSettings;
use crate::topics::TopicSet;
use crate::traits::MqttClient;

/// Payload that opens the blind fully.
pub const PAYLOAD_ON: &str = "ON";
/// Payload that closes the blind.
pub const PAYLOAD_OFF: &str = "OFF";

/// Discovery record; every value is a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiscoveryRecord<'a> {
    /// Display name.
    pub name: &'a str,
    /// Where the hub sends commands.
    pub command_topic: &'a str,
    /// Where the hub reads on/off state.
    pub state_topic: &'a str,
    /// Where the hub reads brightness.
    pub brightness_state_topic: &'a str,
    /// Where the hub sends brightness (same as the command topic).
    pub brightness_command_topic: &'a str,
    /// QoS level.
    pub qos: &'static str,
    /// Payload meaning "open".
    pub payload_on: &'static str,
    /// Payload meaning "closed".
    pub payload_off: &'static str,
    /// The device reports its own state.
    pub optimistic: &'static str,
    /// Icon hint.
    pub icon: &'static str,
    /// Turning on sends brightness only.
    pub on_command_type: &'static str,
}

impl<'a> DiscoveryRecord<'a> {
    /// Build the record for `settings` and its topics.
    pub fn new(settings: &'a DeviceSettings, topics: &'a TopicSet) -> Self {
        Self {
            name: settings.device_name(),
            command_topic: &topics.move_topic,
            state_topic: &topics.state,
            brightness_state_topic: &topics.brightness,
            brightness_command_topic: &topics.move_topic,
            qos: "0",
            payload_on: PAYLOAD_ON,
            payload_off: PAYLOAD_OFF,
            optimistic: "false",
            icon: "mdi:blinds",
            on_command_type: "brightness",
        }
    }

    /// Serialize to the JSON payload.
    pub fn to_json(&self) -> String {
        // Only string fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Publishes the discovery record.
#[derive(Clone, Debug)]
pub struct DiscoveryAnnouncer {
    mqtt: MqttConfig,
}

impl DiscoveryAnnouncer {
    /// Announcer using `mqtt`'s topic layout.
    pub fn new(mqtt: MqttConfig) -> Self {
        Self { mqtt }
    }

    /// Topics for `settings`, computed now.
    pub fn topics(&self, settings: &DeviceSettings) -> TopicSet {
        TopicSet::new(&self.mqtt, settings)
    }

    /// Publish the record for `settings`.
    ///
    /// Topics are derived from `settings` on every call, never cached.
    pub fn announce<C: MqttClient>(
        &self,
        settings: &DeviceSettings,
        client: &mut C,
    ) -> Result<(), C::Error> {
        let topics = self.topics(settings);
        let payload = DiscoveryRecord::new(settings, &topics).to_json();
        client.publish(&topics.discovery, payload.as_bytes(), false)?;
        info!("discovery: announced '{}' on {}", settings.device_name(), topics.discovery);
        Ok(())
    }

    /// Remove the record for `settings` from the hub.
    ///
    /// An empty payload on the discovery topic deletes the entity.
    pub fn retract<C: MqttClient>(
        &self,
        settings: &DeviceSettings,
        client: &mut C,
    ) -> Result<(), C::Error> {
        let topics = self.topics(settings);
        client.publish(&topics.discovery, &[], false)?;
        info!("discovery: retracted '{}'", settings.device_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockMqtt;

    #[test]
    fn record_has_fixed_keys_and_string_values() {
        let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");
        let topics = TopicSet::new(&MqttConfig::default(), &settings);
        let json = DiscoveryRecord::new(&settings, &topics).to_json();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();

        let keys: alloc::vec::Vec<&str> = object.keys().map(String::as_str).collect();
        let mut expected = [
            "name",
            "command_topic",
            "state_topic",
            "brightness_state_topic",
            "brightness_command_topic",
            "qos",
            "payload_on",
            "payload_off",
            "optimistic",
            "icon",
            "on_command_type",
        ];
        expected.sort_unstable();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, expected);
        assert!(object.values().all(|v| v.is_string()));

        assert_eq!(object["name"], "Kitchen");
        assert_eq!(object["command_topic"], "blinds/Kitchen/move");
        assert_eq!(object["brightness_command_topic"], "blinds/Kitchen/move");
        assert_eq!(object["state_topic"], "blinds/Kitchen/state");
        assert_eq!(object["brightness_state_topic"], "blinds/Kitchen/brightness");
        assert_eq!(object["qos"], "0");
        assert_eq!(object["payload_on"], "ON");
        assert_eq!(object["payload_off"], "OFF");
        assert_eq!(object["optimistic"], "false");
        assert_eq!(object["icon"], "mdi:blinds");
        assert_eq!(object["on_command_type"], "brightness");
    }

    #[test]
    fn announce_publishes_to_discovery_topic() {
        let announcer = DiscoveryAnnouncer::new(MqttConfig::default());
        let mut mqtt = MockMqtt::new();
        let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");

        announcer.announce(&settings, &mut mqtt).unwrap();

        let published = mqtt.published_to("homeassistant/light/Kitchen/config");
        assert_eq!(published.len(), 1);
        assert!(!published[0].2, "discovery record is not retained");
    }

    #[test]
    fn topics_follow_current_name() {
        let announcer = DiscoveryAnnouncer::new(MqttConfig::default());
        let mut mqtt = MockMqtt::new();

        let before = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");
        announcer.announce(&before, &mut mqtt).unwrap();

        let after = DeviceSettings::new("Bedroom", "10.0.0.2", "", "");
        announcer.announce(&after, &mut mqtt).unwrap();

        let latest = mqtt.published.last().unwrap();
        assert_eq!(latest.0, "homeassistant/light/Bedroom/config");
        let body = core::str::from_utf8(&latest.1).unwrap();
        assert!(body.contains("blinds/Bedroom/move"));
        assert!(!body.contains("Kitchen"));
    }

    #[test]
    fn retract_publishes_empty_record() {
        let announcer = DiscoveryAnnouncer::new(MqttConfig::default());
        let mut mqtt = MockMqtt::new();
        let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");

        announcer.retract(&settings, &mut mqtt).unwrap();

        let published = mqtt.published_to("homeassistant/light/Kitchen/config");
        assert_eq!(published.len(), 1);
        assert!(published[0].1.is_empty());
    }

    #[test]
    fn announce_propagates_publish_failure() {
        let announcer = DiscoveryAnnouncer::new(MqttConfig::default());
        let mut mqtt = MockMqtt::new();
        mqtt.connected = false;

        assert!(announcer
            .announce(&DeviceSettings::default(), &mut mqtt)
            .is_err());
        assert!(mqtt.published.is_empty());
    }
}
