//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! These are build-time knobs (timings, scales, topic layout). The
//! user-editable values (device name, broker address, credentials) live in
//! [`crate::settings::DeviceSettings`] instead.
//!
//! # Example
//!
//! ```rust
//! use smart_blinds::config::{ActuatorConfig, Config, MqttConfig};
//! use smart_blinds::mapping::InputScale;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.actuator.settle_ms, 700);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_input(InputScale::PERCENT)
//!     .with_actuator(ActuatorConfig::default().with_settle_ms(900))
//!     .with_mqtt(MqttConfig::default().with_topic_base("home/blinds"));
//! assert_eq!(config.input.max(), 100);
//! ```

use heapless::String as HString;

use crate::mapping::{ActuatorPosition, InputScale};

/// Maximum length for short config strings (names, topic bases)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Copy `s` into a bounded string of capacity `N`, truncating if too long.
///
/// Truncation always lands on a UTF-8 character boundary, so the result is
/// a prefix of `s` and never a corrupted string.
pub fn bounded<const N: usize>(s: &str) -> HString<N> {
    let mut out = HString::new();
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    // Cannot fail: `end <= N`.
    let _ = out.push_str(&s[..end]);
    out
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    bounded::<MAX_SHORT_STRING>(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Servo timing and travel range
    pub actuator: ActuatorConfig,
    /// Scale openness commands are expressed on
    pub input: InputScale,
    /// Topic layout and broker session behaviour
    pub mqtt: MqttConfig,
    /// Provisioning portal configuration
    pub portal: PortalConfig,
    /// Persistent settings location
    pub storage: StorageConfig,
}

impl Config {
    /// Set actuator configuration
    pub fn with_actuator(mut self, actuator: ActuatorConfig) -> Self {
        self.actuator = actuator;
        self
    }

    /// Set the openness input scale
    pub fn with_input(mut self, input: InputScale) -> Self {
        self.input = input;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set provisioning portal configuration
    pub fn with_portal(mut self, portal: PortalConfig) -> Self {
        self.portal = portal;
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }
}

// ============================================================================
// Actuator Config
// ============================================================================

/// Servo actuator configuration
#[derive(Clone, Debug)]
pub struct ActuatorConfig {
    /// Time to hold after commanding a position before releasing the servo
    pub settle_ms: u32,
    /// Position that openness 0 maps to
    pub closed: ActuatorPosition,
    /// Position that the top of the input scale maps to
    pub open: ActuatorPosition,
    /// Pulse width for 0 degrees, in microseconds
    pub min_pulse_us: u32,
    /// Pulse width for 180 degrees, in microseconds
    pub max_pulse_us: u32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            settle_ms: 700,
            closed: ActuatorPosition::MIN,
            open: ActuatorPosition::MAX,
            min_pulse_us: 500,
            max_pulse_us: 2500,
        }
    }
}

impl ActuatorConfig {
    /// Set the settle duration
    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Set the travel range
    pub fn with_travel(mut self, closed: ActuatorPosition, open: ActuatorPosition) -> Self {
        self.closed = closed;
        self.open = open;
        self
    }

    /// Set the servo pulse range
    pub fn with_pulse_range(mut self, min_us: u32, max_us: u32) -> Self {
        self.min_pulse_us = min_us;
        self.max_pulse_us = max_us;
        self
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT topic layout and session configuration.
///
/// Broker address and credentials are provisioned at runtime and are not
/// part of this struct.
#[derive(Clone, Debug)]
pub struct MqttConfig {
    /// First topic segment (e.g., "blinds" -> "blinds/<device>/move")
    pub topic_base: ShortString,
    /// Home Assistant discovery prefix
    pub discovery_prefix: ShortString,
    /// Broker port
    pub port: u16,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Delay between broker connection attempts in milliseconds
    pub retry_delay_ms: u32,
    /// Publish state/brightness after each move
    pub publish_state: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            topic_base: short_string("blinds"),
            discovery_prefix: short_string("homeassistant"),
            port: 1883,
            keep_alive_secs: 30,
            retry_delay_ms: 5000,
            publish_state: true,
        }
    }
}

impl MqttConfig {
    /// Set the topic base
    pub fn with_topic_base(mut self, base: &str) -> Self {
        self.topic_base = short_string(base);
        self
    }

    /// Set the discovery prefix
    pub fn with_discovery_prefix(mut self, prefix: &str) -> Self {
        self.discovery_prefix = short_string(prefix);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set the reconnect delay
    pub fn with_retry_delay_ms(mut self, ms: u32) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    /// Enable or disable state publication after moves
    pub fn with_publish_state(mut self, enabled: bool) -> Self {
        self.publish_state = enabled;
        self
    }
}

// ============================================================================
// Portal Config
// ============================================================================

/// Provisioning portal configuration
#[derive(Clone, Debug)]
pub struct PortalConfig {
    /// SSID of the setup access point
    pub ap_name: ShortString,
    /// HTTP port the portal listens on
    pub port: u16,
    /// Seconds before an idle portal gives up (0 = never)
    pub timeout_secs: u32,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            ap_name: short_string("SmartBlinds-Setup"),
            port: 80,
            timeout_secs: 180,
            cors_permissive: false,
        }
    }
}

impl PortalConfig {
    /// Set the access point name
    pub fn with_ap_name(mut self, name: &str) -> Self {
        self.ap_name = short_string(name);
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the portal timeout
    pub fn with_timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Portal timeout in milliseconds, if one is configured.
    pub fn timeout_ms(&self) -> Option<u64> {
        (self.timeout_secs > 0).then(|| self.timeout_secs as u64 * 1000)
    }
}

// ============================================================================
// Storage Config
// ============================================================================

/// Persistent settings location
#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Path of the settings file on the mounted filesystem
    pub settings_path: ShortString,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: short_string("/config.json"),
        }
    }
}

impl StorageConfig {
    /// Set the settings path
    pub fn with_settings_path(mut self, path: &str) -> Self {
        self.settings_path = short_string(path);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
