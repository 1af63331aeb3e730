//! Topic names derived from the device name.
//!
//! Topics are rebuilt from the current [`DeviceSettings`] every time they
//! are needed, so renaming the device through the portal takes effect on
//! the next message without any cache to invalidate.

extern crate alloc;
use alloc::format;
use alloc::string::String;

use crate::config::MqttConfig;
use crate::settings::DeviceSettings;

/// All topics a device uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSet {
    /// `<base>/<device>/move`, openness commands from the hub.
    pub move_topic: String,
    /// `<base>/<device>/state`, `ON` or `OFF`.
    pub state: String,
    /// `<base>/<device>/brightness`, current openness.
    pub brightness: String,
    /// `<prefix>/light/<device>/config`, discovery record.
    pub discovery: String,
}

impl TopicSet {
    /// Build the topics for `settings` under `config`'s base and prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use smart_blinds::config::MqttConfig;
    /// use smart_blinds::settings::DeviceSettings;
    /// use smart_blinds::topics::TopicSet;
    ///
    /// let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");
    /// let topics = TopicSet::new(&MqttConfig::default(), &settings);
    ///
    /// assert_eq!(topics.move_topic, "blinds/Kitchen/move");
    /// assert_eq!(topics.discovery, "homeassistant/light/Kitchen/config");
    /// ```
    pub fn new(config: &MqttConfig, settings: &DeviceSettings) -> Self {
        let base = config.topic_base.as_str();
        let name = settings.device_name();
        Self {
            move_topic: format!("{}/{}/move", base, name),
            state: format!("{}/{}/state", base, name),
            brightness: format!("{}/{}/brightness", base, name),
            discovery: format!(
                "{}/light/{}/config",
                config.discovery_prefix.as_str(),
                name
            ),
        }
    }
}

/// Broker client id: `<device name>-<identity>`.
///
/// The identity (MAC or hostname) keeps two blinds with the same name from
/// kicking each other off the broker.
pub fn client_id(settings: &DeviceSettings, identity: &str) -> String {
    format!("{}-{}", settings.device_name(), identity)
}
