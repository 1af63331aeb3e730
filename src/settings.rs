//! Persistent device settings.
//!
//! The four user-editable values (device name, broker address and broker
//! credentials) are stored as one JSON object:
//!
//! ```json
//! {"deviceName":"Kitchen","mqttServer":"192.168.1.10","mqttUsername":"ha","mqttPassword":"secret"}
//! ```
//!
//! Each field has a fixed capacity (15, 15, 23 and 32 bytes). Longer values
//! are truncated at a UTF-8 character boundary whenever they enter a
//! [`DeviceSettings`], whether from the portal form or from a file written
//! by older firmware, so a stored record is always well formed.

extern crate alloc;
use alloc::string::{String, ToString};
use core::fmt;

use heapless::String as HString;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::bounded;
use crate::traits::FileSystem;

/// Capacity of the device name.
pub const DEVICE_NAME_LEN: usize = 15;
/// Capacity of the broker address.
pub const BROKER_ADDRESS_LEN: usize = 15;
/// Capacity of the broker username.
pub const BROKER_USERNAME_LEN: usize = 23;
/// Capacity of the broker password.
pub const BROKER_PASSWORD_LEN: usize = 32;

/// Device name used before the device has been provisioned.
pub const DEFAULT_DEVICE_NAME: &str = "SmartBlinds";
/// Broker address used before the device has been provisioned.
pub const DEFAULT_BROKER_ADDRESS: &str = "0.0.0.0";

// ============================================================================
// Errors
// ============================================================================

/// Settings persistence failures.
///
/// Every load failure means the same thing to the caller (no usable
/// settings; fall back to defaults and provision), the variants only keep
/// the cause for the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// Filesystem could not be mounted, even after formatting.
    StorageUnavailable,
    /// No settings file at the configured path.
    NotFound,
    /// File exists but is not a complete settings record.
    Malformed(String),
    /// File could not be opened or written.
    Io(String),
    /// Fewer bytes reached the file than were serialized.
    IncompleteWrite {
        /// Bytes actually written.
        written: usize,
        /// Bytes that should have been written.
        expected: usize,
    },
}

impl SettingsError {
    /// Whether this error came from loading rather than saving.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SettingsError::StorageUnavailable | SettingsError::NotFound | SettingsError::Malformed(_)
        )
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::StorageUnavailable => write!(f, "storage unavailable"),
            SettingsError::NotFound => write!(f, "settings file not found"),
            SettingsError::Malformed(e) => write!(f, "settings file malformed: {}", e),
            SettingsError::Io(e) => write!(f, "settings I/O error: {}", e),
            SettingsError::IncompleteWrite { written, expected } => {
                write!(f, "settings write incomplete ({} of {} bytes)", written, expected)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SettingsError {}

// ============================================================================
// Device Settings
// ============================================================================

/// User-editable device settings.
///
/// Fields are private so every value passes through [`bounded`] on its way in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSettings {
    device_name: HString<DEVICE_NAME_LEN>,
    broker_address: HString<BROKER_ADDRESS_LEN>,
    broker_username: HString<BROKER_USERNAME_LEN>,
    broker_password: HString<BROKER_PASSWORD_LEN>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_NAME, DEFAULT_BROKER_ADDRESS, "", "")
    }
}

impl DeviceSettings {
    /// Build settings, truncating over-long values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use smart_blinds::settings::DeviceSettings;
    ///
    /// let s = DeviceSettings::new("LivingRoomWindow", "10.0.0.2", "", "");
    /// assert_eq!(s.device_name(), "LivingRoomWindo");
    /// ```
    pub fn new(device_name: &str, broker_address: &str, username: &str, password: &str) -> Self {
        Self {
            device_name: bounded(device_name),
            broker_address: bounded(broker_address),
            broker_username: bounded(username),
            broker_password: bounded(password),
        }
    }

    /// Device name, used in every topic.
    pub fn device_name(&self) -> &str {
        self.device_name.as_str()
    }

    /// Broker host name or IP address.
    pub fn broker_address(&self) -> &str {
        self.broker_address.as_str()
    }

    /// Broker username (empty = anonymous).
    pub fn broker_username(&self) -> &str {
        self.broker_username.as_str()
    }

    /// Broker password.
    pub fn broker_password(&self) -> &str {
        self.broker_password.as_str()
    }

    /// Whether broker credentials are configured.
    pub fn has_credentials(&self) -> bool {
        !self.broker_username.is_empty()
    }

    /// Whether broker address or credentials differ from `other`.
    pub fn broker_differs(&self, other: &DeviceSettings) -> bool {
        self.broker_address != other.broker_address
            || self.broker_username != other.broker_username
            || self.broker_password != other.broker_password
    }
}

// ============================================================================
// Provisioning Parameters
// ============================================================================

/// Raw values submitted through the setup portal.
///
/// Field names match the settings file keys so the same names work for the
/// HTML form and for JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningParams {
    /// Device name.
    #[serde(rename = "deviceName", default)]
    pub device_name: String,
    /// Broker address.
    #[serde(rename = "mqttServer", default)]
    pub broker_address: String,
    /// Broker username.
    #[serde(rename = "mqttUsername", default)]
    pub broker_username: String,
    /// Broker password.
    #[serde(rename = "mqttPassword", default)]
    pub broker_password: String,
}

impl From<&DeviceSettings> for ProvisioningParams {
    fn from(settings: &DeviceSettings) -> Self {
        Self {
            device_name: settings.device_name().to_string(),
            broker_address: settings.broker_address().to_string(),
            broker_username: settings.broker_username().to_string(),
            broker_password: settings.broker_password().to_string(),
        }
    }
}

impl From<&ProvisioningParams> for DeviceSettings {
    fn from(params: &ProvisioningParams) -> Self {
        DeviceSettings::new(
            &params.device_name,
            &params.broker_address,
            &params.broker_username,
            &params.broker_password,
        )
    }
}

// ============================================================================
// File Format
// ============================================================================

/// On-disk record, write side.
#[derive(Serialize)]
struct StoredSettings<'a> {
    #[serde(rename = "deviceName")]
    device_name: &'a str,
    #[serde(rename = "mqttServer")]
    broker_address: &'a str,
    #[serde(rename = "mqttUsername")]
    broker_username: &'a str,
    #[serde(rename = "mqttPassword")]
    broker_password: &'a str,
}

impl<'a> From<&'a DeviceSettings> for StoredSettings<'a> {
    fn from(s: &'a DeviceSettings) -> Self {
        Self {
            device_name: s.device_name(),
            broker_address: s.broker_address(),
            broker_username: s.broker_username(),
            broker_password: s.broker_password(),
        }
    }
}

/// Serialize settings to the on-disk JSON form.
pub fn to_json(settings: &DeviceSettings) -> Result<String, SettingsError> {
    serde_json::to_string(&StoredSettings::from(settings))
        .map_err(|e| SettingsError::Io(e.to_string()))
}

/// Parse the on-disk JSON form.
///
/// All four keys are required. Missing keys and non-string values are
/// [`SettingsError::Malformed`]; there is no partially populated result.
pub fn from_json(bytes: &[u8]) -> Result<DeviceSettings, SettingsError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| SettingsError::Malformed(e.to_string()))?;

    let field = |key: &str| -> Result<&str, SettingsError> {
        value
            .get(key)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SettingsError::Malformed(alloc::format!("missing field `{}`", key)))
    };

    Ok(DeviceSettings::new(
        field("deviceName")?,
        field("mqttServer")?,
        field("mqttUsername")?,
        field("mqttPassword")?,
    ))
}

// ============================================================================
// Settings Store
// ============================================================================

/// Loads and saves [`DeviceSettings`] on a [`FileSystem`].
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::MockFileSystem;
/// use smart_blinds::settings::{DeviceSettings, SettingsStore};
///
/// let mut store = SettingsStore::new(MockFileSystem::new(), "/config.json");
/// let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "ha", "pw");
///
/// store.save(&settings).unwrap();
/// assert_eq!(store.load().unwrap(), settings);
/// ```
pub struct SettingsStore<F> {
    fs: F,
    path: String,
    mounted: bool,
}

impl<F: FileSystem> SettingsStore<F> {
    /// Create a store for the file at `path`.
    pub fn new(fs: F, path: &str) -> Self {
        Self {
            fs,
            path: path.to_string(),
            mounted: false,
        }
    }

    /// Path of the settings file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Borrow the filesystem (for inspection).
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Mutably borrow the filesystem.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Mount without formatting, falling back to a formatting mount.
    ///
    /// A fresh or corrupt partition is formatted on first boot; a partition
    /// that mounts cleanly is never touched.
    fn ensure_mounted(&mut self) -> Result<(), SettingsError> {
        if self.mounted {
            return Ok(());
        }

        if let Err(e) = self.fs.mount(false) {
            warn!("settings: mount failed ({:?}), formatting", e);
            if let Err(e) = self.fs.mount(true) {
                warn!("settings: mount after format failed: {:?}", e);
                return Err(SettingsError::StorageUnavailable);
            }
        }

        self.mounted = true;
        Ok(())
    }

    /// Load the stored settings.
    ///
    /// # Errors
    ///
    /// Any error means "no usable settings": the caller should use
    /// [`DeviceSettings::default`] and start provisioning.
    pub fn load(&mut self) -> Result<DeviceSettings, SettingsError> {
        self.ensure_mounted()?;

        if !self.fs.exists(&self.path) {
            return Err(SettingsError::NotFound);
        }

        let bytes = self
            .fs
            .read(&self.path)
            .map_err(|e| SettingsError::Malformed(alloc::format!("{:?}", e)))?;
        let settings = from_json(&bytes)?;

        info!("settings: loaded for '{}'", settings.device_name());
        Ok(settings)
    }

    /// Overwrite the stored settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when the file cannot be written and
    /// [`SettingsError::IncompleteWrite`] on a short write.
    pub fn save(&mut self, settings: &DeviceSettings) -> Result<(), SettingsError> {
        self.ensure_mounted()?;

        let json = to_json(settings)?;
        let written = self
            .fs
            .write(&self.path, json.as_bytes())
            .map_err(|e| SettingsError::Io(alloc::format!("{:?}", e)))?;

        if written != json.len() {
            return Err(SettingsError::IncompleteWrite {
                written,
                expected: json.len(),
            });
        }

        info!("settings: saved to {}", self.path);
        Ok(())
    }

    /// One-shot "provisioning complete" callback.
    ///
    /// Converts the submitted form into settings and persists them on a
    /// best-effort basis: a failed save is logged, and the new settings
    /// are still returned so the device runs with them until next boot.
    pub fn apply_provisioning(&mut self, params: &ProvisioningParams) -> DeviceSettings {
        let settings = DeviceSettings::from(params);
        if let Err(e) = self.save(&settings) {
            warn!("settings: {} (continuing with unsaved settings)", e);
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockFileSystem;

    const PATH: &str = "/config.json";

    fn sample() -> DeviceSettings {
        DeviceSettings::new("Kitchen", "192.168.1.10", "homeassistant", "hunter2")
    }

    #[test]
    fn defaults() {
        let s = DeviceSettings::default();
        assert_eq!(s.device_name(), "SmartBlinds");
        assert_eq!(s.broker_address(), "0.0.0.0");
        assert_eq!(s.broker_username(), "");
        assert_eq!(s.broker_password(), "");
        assert!(!s.has_credentials());
    }

    #[test]
    fn truncates_each_field_to_capacity() {
        let s = DeviceSettings::new(
            &"n".repeat(40),
            &"a".repeat(40),
            &"u".repeat(40),
            &"p".repeat(40),
        );
        assert_eq!(s.device_name().len(), DEVICE_NAME_LEN);
        assert_eq!(s.broker_address().len(), BROKER_ADDRESS_LEN);
        assert_eq!(s.broker_username().len(), BROKER_USERNAME_LEN);
        assert_eq!(s.broker_password().len(), BROKER_PASSWORD_LEN);
    }

    #[test]
    fn json_uses_file_keys() {
        let json = to_json(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"deviceName":"Kitchen","mqttServer":"192.168.1.10","mqttUsername":"homeassistant","mqttPassword":"hunter2"}"#
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = SettingsStore::new(MockFileSystem::new(), PATH);
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn round_trip_with_escaped_characters() {
        let settings = DeviceSettings::new("Den \"East\"", "broker", "u\\ser", "p@ss/\u{e9}");
        let mut store = SettingsStore::new(MockFileSystem::new(), PATH);
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let mut store = SettingsStore::new(MockFileSystem::new(), PATH);
        assert_eq!(store.load(), Err(SettingsError::NotFound));
    }

    #[test]
    fn load_rejects_missing_field() {
        let mut fs = MockFileSystem::new();
        fs.insert(PATH, br#"{"deviceName":"Kitchen","mqttServer":"10.0.0.2"}"#);
        let mut store = SettingsStore::new(fs, PATH);

        let err = store.load().unwrap_err();
        assert!(matches!(err, SettingsError::Malformed(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn load_rejects_garbage() {
        let mut fs = MockFileSystem::new();
        fs.insert(PATH, b"\x00\x01not json");
        let mut store = SettingsStore::new(fs, PATH);
        assert!(matches!(store.load(), Err(SettingsError::Malformed(_))));
    }

    #[test]
    fn load_rejects_non_string_values() {
        let mut fs = MockFileSystem::new();
        fs.insert(
            PATH,
            br#"{"deviceName":7,"mqttServer":"a","mqttUsername":"b","mqttPassword":"c"}"#,
        );
        let mut store = SettingsStore::new(fs, PATH);
        assert!(matches!(store.load(), Err(SettingsError::Malformed(_))));
    }

    #[test]
    fn load_truncates_overlong_stored_values() {
        let mut fs = MockFileSystem::new();
        fs.insert(
            PATH,
            br#"{"deviceName":"AVeryLongDeviceNameIndeed","mqttServer":"a","mqttUsername":"b","mqttPassword":"c"}"#,
        );
        let mut store = SettingsStore::new(fs, PATH);
        assert_eq!(store.load().unwrap().device_name(), "AVeryLongDevice");
    }

    #[test]
    fn unformatted_partition_is_formatted_on_load() {
        let mut fs = MockFileSystem::new();
        fs.formatted = false;
        let mut store = SettingsStore::new(fs, PATH);

        assert_eq!(store.load(), Err(SettingsError::NotFound));
        assert_eq!(store.fs().mount_calls, [false, true]);
        assert!(store.fs().formatted);
    }

    #[test]
    fn clean_partition_is_never_formatted() {
        let mut fs = MockFileSystem::new();
        fs.insert(PATH, to_json(&sample()).unwrap().as_bytes());
        let mut store = SettingsStore::new(fs, PATH);

        store.load().unwrap();
        assert_eq!(store.fs().mount_calls, [false]);
    }

    #[test]
    fn broken_storage_is_unavailable() {
        let mut fs = MockFileSystem::new();
        fs.broken = true;
        let mut store = SettingsStore::new(fs, PATH);

        assert_eq!(store.load(), Err(SettingsError::StorageUnavailable));
        assert_eq!(store.save(&sample()), Err(SettingsError::StorageUnavailable));
    }

    #[test]
    fn mounts_only_once() {
        let mut store = SettingsStore::new(MockFileSystem::new(), PATH);
        store.save(&sample()).unwrap();
        store.load().unwrap();
        store.load().unwrap();
        assert_eq!(store.fs().mount_calls.len(), 1);
    }

    #[test]
    fn failed_write_is_io_error() {
        let mut fs = MockFileSystem::new();
        fs.fail_writes = true;
        let mut store = SettingsStore::new(fs, PATH);
        assert!(matches!(store.save(&sample()), Err(SettingsError::Io(_))));
    }

    #[test]
    fn short_write_is_incomplete() {
        let mut fs = MockFileSystem::new();
        fs.write_limit = Some(10);
        let mut store = SettingsStore::new(fs, PATH);

        match store.save(&sample()) {
            Err(SettingsError::IncompleteWrite { written, expected }) => {
                assert_eq!(written, 10);
                assert!(expected > 10);
            }
            other => panic!("expected incomplete write, got {:?}", other),
        }
    }

    #[test]
    fn apply_provisioning_saves_and_returns() {
        let mut store = SettingsStore::new(MockFileSystem::new(), PATH);
        let params = ProvisioningParams {
            device_name: "Office".into(),
            broker_address: "10.1.1.1".into(),
            broker_username: "".into(),
            broker_password: "".into(),
        };

        let settings = store.apply_provisioning(&params);
        assert_eq!(settings.device_name(), "Office");
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn apply_provisioning_survives_save_failure() {
        let mut fs = MockFileSystem::new();
        fs.fail_writes = true;
        let mut store = SettingsStore::new(fs, PATH);

        let params = ProvisioningParams::from(&sample());
        assert_eq!(store.apply_provisioning(&params), sample());
    }

    #[test]
    fn broker_differs() {
        let a = sample();
        let renamed = DeviceSettings::new("Bedroom", "192.168.1.10", "homeassistant", "hunter2");
        let moved = DeviceSettings::new("Kitchen", "192.168.1.11", "homeassistant", "hunter2");
        assert!(!a.broker_differs(&renamed));
        assert!(a.broker_differs(&moved));
    }
}
