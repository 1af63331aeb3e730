//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware, storage and network
//! traits, enabling development and testing on desktop without a servo.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockServo`] | [`ServoActuator`] | Records attach/write/detach calls |
//! | [`MockDelay`] | [`DelayNs`] | Records settle waits without sleeping |
//! | [`MockConsole`] | [`SerialConsole`] | Queued input lines, captured output |
//! | [`MockButton`] | [`ConfigButton`] | Simulated setup button |
//! | [`MockResetDetector`] | [`ResetDetector`] | Simulated double reset |
//! | [`MockNetwork`] | [`NetworkLink`] | Switchable network status |
//! | [`MockMqtt`] | [`MqttClient`] | Captures pub/sub operations |
//! | [`MockFileSystem`] | [`FileSystem`] | In-memory files with failure switches |
//! | [`MockPortal`] | [`Provisioner`] | Queued form submissions |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! [`MockPlatform`] bundles them for [`crate::BlindsController`].
//!
//! [`ServoActuator`]: crate::traits::ServoActuator
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//! [`SerialConsole`]: crate::traits::SerialConsole
//! [`ConfigButton`]: crate::traits::ConfigButton
//! [`ResetDetector`]: crate::traits::ResetDetector
//! [`NetworkLink`]: crate::traits::NetworkLink
//! [`MqttClient`]: crate::traits::MqttClient
//! [`FileSystem`]: crate::traits::FileSystem
//! [`Provisioner`]: crate::traits::Provisioner
//! [`Clock`]: crate::traits::Clock

extern crate alloc;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::settings::{DeviceSettings, ProvisioningParams};
use crate::traits::{
    Board, Clock, ConfigButton, FileSystem, MqttClient, MqttMessage, NetworkLink, Platform,
    Provisioner, ResetDetector, SerialConsole, ServoActuator,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// One call made on a [`MockServo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServoEvent {
    /// `attach()`
    Attach,
    /// `write_angle(degrees)`
    Write(u8),
    /// `detach()`
    Detach,
}

/// Mock servo for testing.
///
/// Records every call for verification. Use the public fields to inspect
/// state after test operations.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::{MockServo, ServoEvent};
/// use smart_blinds::traits::ServoActuator;
///
/// let mut servo = MockServo::new();
/// servo.attach().unwrap();
/// servo.write_angle(45).unwrap();
///
/// assert!(servo.attached);
/// assert_eq!(servo.angle, Some(45));
/// assert_eq!(servo.events, [ServoEvent::Attach, ServoEvent::Write(45)]);
/// ```
#[derive(Debug, Default)]
pub struct MockServo {
    /// Every call, in order.
    pub events: Vec<ServoEvent>,
    /// Last angle written.
    pub angle: Option<u8>,
    /// Whether the signal is currently attached.
    pub attached: bool,
    /// Make `write_angle` fail.
    pub fail_writes: bool,
}

impl MockServo {
    /// Creates a new detached mock servo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Angles written so far, in order.
    pub fn writes(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ServoEvent::Write(deg) => Some(*deg),
                _ => None,
            })
            .collect()
    }
}

impl ServoActuator for MockServo {
    type Error = ();

    fn attach(&mut self) -> Result<(), ()> {
        self.events.push(ServoEvent::Attach);
        self.attached = true;
        Ok(())
    }

    fn write_angle(&mut self, degrees: u8) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.events.push(ServoEvent::Write(degrees));
        self.angle = Some(degrees);
        Ok(())
    }

    fn detach(&mut self) -> Result<(), ()> {
        self.events.push(ServoEvent::Detach);
        self.attached = false;
        Ok(())
    }
}

/// Mock delay that records requested waits and returns immediately.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every `delay_ms` argument, in order.
    pub calls_ms: Vec<u32>,
    /// Sum of all waits in milliseconds.
    pub total_ms: u64,
}

impl MockDelay {
    /// Creates a new mock delay.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += (ns / 1_000_000) as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls_ms.push(ms);
        self.total_ms += ms as u64;
    }
}

/// Mock serial console.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::MockConsole;
/// use smart_blinds::traits::SerialConsole;
///
/// let mut console = MockConsole::new();
/// console.queue_line("128");
///
/// assert_eq!(console.read_line().as_deref(), Some("128"));
/// assert_eq!(console.read_line(), None);
///
/// console.write_line("Ready...");
/// assert_eq!(console.output, ["Ready..."]);
/// ```
#[derive(Debug, Default)]
pub struct MockConsole {
    /// Lines waiting to be read.
    pub input: VecDeque<String>,
    /// Lines written by the device.
    pub output: Vec<String>,
}

impl MockConsole {
    /// Creates a new empty console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line as if typed by the user (without terminator).
    pub fn queue_line(&mut self, line: &str) {
        self.input.push_back(line.to_string());
    }

    /// Last line written, if any.
    pub fn last_output(&self) -> Option<&str> {
        self.output.last().map(String::as_str)
    }
}

impl SerialConsole for MockConsole {
    fn read_line(&mut self) -> Option<String> {
        self.input.pop_front()
    }

    fn write_line(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}

/// Mock setup button.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::MockButton;
/// use smart_blinds::traits::ConfigButton;
///
/// let mut button = MockButton::new();
/// button.press();
///
/// assert!(button.just_pressed()); // Once
/// assert!(!button.just_pressed()); // Consumed
/// assert!(button.is_pressed()); // Still held
/// ```
#[derive(Debug, Default)]
pub struct MockButton {
    pressed: bool,
    just_pressed_state: bool,
}

impl MockButton {
    /// Creates a released button.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a press (just_pressed will be true once).
    pub fn press(&mut self) {
        self.pressed = true;
        self.just_pressed_state = true;
    }

    /// Release the button.
    pub fn release(&mut self) {
        self.pressed = false;
    }
}

impl ConfigButton for MockButton {
    fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn just_pressed(&mut self) -> bool {
        let was = self.just_pressed_state;
        self.just_pressed_state = false;
        was
    }
}

/// Mock double-reset detector.
#[derive(Debug)]
pub struct MockResetDetector {
    pending: bool,
    /// Whether the persistent flag is still armed.
    pub armed: bool,
    /// Length of the detection window.
    pub window_ms: u64,
}

impl MockResetDetector {
    /// Detector for a normal boot.
    pub fn new() -> Self {
        Self {
            pending: false,
            armed: true,
            window_ms: 10_000,
        }
    }

    /// Detector that reports a double reset at boot.
    pub fn double_reset() -> Self {
        Self {
            pending: true,
            ..Self::new()
        }
    }

    /// Simulate a detection while running.
    pub fn trigger(&mut self) {
        self.pending = true;
    }
}

impl Default for MockResetDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetDetector for MockResetDetector {
    fn detected(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }

    fn tick(&mut self, now_ms: u64) {
        if self.armed && now_ms >= self.window_ms {
            self.armed = false;
        }
    }
}

/// Mock clock for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::MockClock;
/// use smart_blinds::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Storage Mock
// ============================================================================

/// Errors reported by [`MockFileSystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockFsError {
    /// Partition will not mount.
    Unmountable,
    /// Operation before a successful mount.
    NotMounted,
    /// No such file.
    NotFound,
    /// Write refused.
    WriteFailed,
}

/// In-memory filesystem.
///
/// Starts formatted and unmounted. Flip the public switches to simulate a
/// blank partition (`formatted = false`), dead flash (`broken = true`),
/// failing writes or a full partition (`write_limit`).
#[derive(Debug)]
pub struct MockFileSystem {
    /// Stored files.
    pub files: BTreeMap<String, Vec<u8>>,
    /// Whether the partition holds a valid filesystem.
    pub formatted: bool,
    /// Partition cannot be mounted even after formatting.
    pub broken: bool,
    /// Currently mounted.
    pub mounted: bool,
    /// `format_if_failed` argument of every mount call.
    pub mount_calls: Vec<bool>,
    /// Make writes fail outright.
    pub fail_writes: bool,
    /// Write at most this many bytes.
    pub write_limit: Option<usize>,
}

impl MockFileSystem {
    /// Creates a formatted, empty, unmounted filesystem.
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            formatted: true,
            broken: false,
            mounted: false,
            mount_calls: Vec::new(),
            fail_writes: false,
            write_limit: None,
        }
    }

    /// Store a file directly (bypasses mount state).
    pub fn insert(&mut self, path: &str, contents: impl AsRef<[u8]>) {
        self.files
            .insert(path.to_string(), contents.as_ref().to_vec());
    }

    /// Contents of a file as UTF-8, if present.
    pub fn contents(&self, path: &str) -> Option<&str> {
        self.files
            .get(path)
            .and_then(|bytes| core::str::from_utf8(bytes).ok())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    type Error = MockFsError;

    fn mount(&mut self, format_if_failed: bool) -> Result<(), MockFsError> {
        self.mount_calls.push(format_if_failed);
        if self.broken {
            return Err(MockFsError::Unmountable);
        }
        if !self.formatted {
            if !format_if_failed {
                return Err(MockFsError::Unmountable);
            }
            self.files.clear();
            self.formatted = true;
        }
        self.mounted = true;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> bool {
        self.mounted && self.files.contains_key(path)
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>, MockFsError> {
        if !self.mounted {
            return Err(MockFsError::NotMounted);
        }
        self.files.get(path).cloned().ok_or(MockFsError::NotFound)
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> Result<usize, MockFsError> {
        if !self.mounted {
            return Err(MockFsError::NotMounted);
        }
        if self.fail_writes {
            return Err(MockFsError::WriteFailed);
        }
        let n = self
            .write_limit
            .map_or(contents.len(), |limit| limit.min(contents.len()));
        self.files.insert(path.to_string(), contents[..n].to_vec());
        Ok(n)
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock network link.
#[derive(Debug)]
pub struct MockNetwork {
    /// Whether the network is up.
    pub up: bool,
    /// Identity string.
    pub identity: String,
}

impl MockNetwork {
    /// Network that is up.
    pub fn new() -> Self {
        Self {
            up: true,
            identity: "a1b2c3".to_string(),
        }
    }
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkLink for MockNetwork {
    fn is_up(&self) -> bool {
        self.up
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

/// One operation performed on a [`MockMqtt`], in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MqttOp {
    /// `connect()`
    Connect,
    /// `subscribe(topic)`
    Subscribe(String),
    /// `publish(topic, ..)`
    Publish(String),
}

/// Mock MQTT client for testing.
///
/// Records all publish/subscribe operations and allows injecting
/// incoming messages for testing message handling.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::MockMqtt;
/// use smart_blinds::traits::MqttClient;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("blinds/Kitchen/move", b"128".to_vec());
/// assert_eq!(mqtt.try_recv().unwrap().payload_str(), Some("128"));
///
/// mqtt.subscribe("blinds/Kitchen/move").unwrap();
/// assert!(mqtt.is_subscribed("blinds/Kitchen/move"));
///
/// mqtt.publish("blinds/Kitchen/state", b"ON", true).unwrap();
/// assert_eq!(mqtt.published_to("blinds/Kitchen/state").len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMqtt {
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: VecDeque<MqttMessage>,
    /// Whether the client is connected.
    pub connected: bool,
    /// Whether `connect()` succeeds and connects.
    pub accept_connections: bool,
    /// Make `subscribe` fail even while connected.
    pub fail_subscribe: bool,
    /// Every operation, in call order.
    pub operations: Vec<MqttOp>,
}

impl MockMqtt {
    /// Creates a new mock MQTT client in connected state.
    pub fn new() -> Self {
        Self {
            connected: true,
            accept_connections: true,
            ..Default::default()
        }
    }

    /// Creates a disconnected client that connects when asked.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::new()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push_back(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }

    /// Payloads published to a topic, as UTF-8.
    pub fn payloads_on(&self, topic: &str) -> Vec<&str> {
        self.published_to(topic)
            .into_iter()
            .filter_map(|(_, payload, _)| core::str::from_utf8(payload).ok())
            .collect()
    }

    /// Simulate the broker dropping the connection.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn connect(&mut self) -> Result<(), ()> {
        self.operations.push(MqttOp::Connect);
        if self.accept_connections {
            self.connected = true;
            Ok(())
        } else {
            Err(())
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.operations.push(MqttOp::Publish(topic.into()));
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        if !self.connected || self.fail_subscribe {
            return Err(());
        }
        self.operations.push(MqttOp::Subscribe(topic.into()));
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        self.incoming.pop_front()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Mock provisioning portal.
///
/// # Example
///
/// ```rust
/// use smart_blinds::hal::MockPortal;
/// use smart_blinds::settings::{DeviceSettings, ProvisioningParams};
/// use smart_blinds::traits::Provisioner;
///
/// let mut portal = MockPortal::new();
/// portal.submit(ProvisioningParams::default());
/// assert!(portal.poll().is_none()); // closed portals accept nothing
///
/// portal.open(&DeviceSettings::default()).unwrap();
/// assert!(portal.poll().is_some());
/// ```
#[derive(Debug, Default)]
pub struct MockPortal {
    /// Whether the portal is open.
    pub open: bool,
    /// Times the portal was opened.
    pub open_count: u32,
    /// Settings the form was last pre-filled with.
    pub prefilled: Option<DeviceSettings>,
    /// Submissions waiting to be collected.
    pub submissions: VecDeque<ProvisioningParams>,
}

impl MockPortal {
    /// Creates a closed portal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user submitting the form.
    pub fn submit(&mut self, params: ProvisioningParams) {
        self.submissions.push_back(params);
    }
}

impl Provisioner for MockPortal {
    type Error = ();

    fn open(&mut self, current: &DeviceSettings) -> Result<(), ()> {
        self.open = true;
        self.open_count += 1;
        self.prefilled = Some(current.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn poll(&mut self) -> Option<ProvisioningParams> {
        if self.open {
            self.submissions.pop_front()
        } else {
            None
        }
    }
}

// ============================================================================
// Platform
// ============================================================================

/// All-mock platform for tests and host demos.
#[derive(Debug)]
pub struct MockPlatform;

impl Platform for MockPlatform {
    type Servo = MockServo;
    type Delay = MockDelay;
    type Console = MockConsole;
    type Button = MockButton;
    type Reset = MockResetDetector;
    type Network = MockNetwork;
    type Mqtt = MockMqtt;
    type Fs = MockFileSystem;
    type Portal = MockPortal;
}

/// A board of fresh mocks: network up, broker connected, empty storage.
pub fn mock_board() -> Board<MockPlatform> {
    Board {
        servo: MockServo::new(),
        delay: MockDelay::new(),
        console: MockConsole::new(),
        button: MockButton::new(),
        reset: MockResetDetector::new(),
        network: MockNetwork::new(),
        mqtt: MockMqtt::new(),
        fs: MockFileSystem::new(),
        portal: MockPortal::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockServo Tests
    // =========================================================================

    #[test]
    fn mock_servo_default() {
        let servo = MockServo::new();
        assert!(servo.events.is_empty());
        assert_eq!(servo.angle, None);
        assert!(!servo.attached);
    }

    #[test]
    fn mock_servo_records_writes() {
        let mut servo = MockServo::new();
        servo.write_angle(10).unwrap();
        servo.write_angle(90).unwrap();
        assert_eq!(servo.writes(), [10, 90]);
        assert_eq!(servo.angle, Some(90));
    }

    #[test]
    fn mock_servo_fail_writes() {
        let mut servo = MockServo::new();
        servo.fail_writes = true;
        assert!(servo.write_angle(10).is_err());
        assert_eq!(servo.angle, None);
    }

    // =========================================================================
    // MockDelay Tests
    // =========================================================================

    #[test]
    fn mock_delay_records() {
        let mut delay = MockDelay::new();
        delay.delay_ms(700);
        delay.delay_ms(300);
        assert_eq!(delay.calls_ms, [700, 300]);
        assert_eq!(delay.total_ms, 1000);
    }

    // =========================================================================
    // MockFileSystem Tests
    // =========================================================================

    #[test]
    fn mock_fs_requires_mount() {
        let mut fs = MockFileSystem::new();
        assert_eq!(fs.write("/a", b"x"), Err(MockFsError::NotMounted));
        fs.mount(false).unwrap();
        assert_eq!(fs.write("/a", b"x"), Ok(1));
        assert_eq!(fs.read("/a"), Ok(b"x".to_vec()));
    }

    #[test]
    fn mock_fs_format_clears_files() {
        let mut fs = MockFileSystem::new();
        fs.insert("/a", b"old");
        fs.formatted = false;

        assert_eq!(fs.mount(false), Err(MockFsError::Unmountable));
        fs.mount(true).unwrap();
        assert!(!fs.exists("/a"));
    }

    #[test]
    fn mock_fs_write_limit() {
        let mut fs = MockFileSystem::new();
        fs.write_limit = Some(3);
        fs.mount(false).unwrap();
        assert_eq!(fs.write("/a", b"hello"), Ok(3));
        assert_eq!(fs.contents("/a"), Some("hel"));
    }

    // =========================================================================
    // MockMqtt Tests
    // =========================================================================

    #[test]
    fn mock_mqtt_default_connected() {
        let mqtt = MockMqtt::new();
        assert!(mqtt.is_connected());
        assert!(mqtt.published.is_empty());
        assert!(mqtt.subscriptions.is_empty());
    }

    #[test]
    fn mock_mqtt_disconnected_rejects_traffic() {
        let mut mqtt = MockMqtt::disconnected();
        assert!(mqtt.publish("t", b"x", false).is_err());
        assert!(mqtt.subscribe("t").is_err());

        mqtt.connect().unwrap();
        assert!(mqtt.publish("t", b"x", false).is_ok());
    }

    #[test]
    fn mock_mqtt_refuses_connections() {
        let mut mqtt = MockMqtt::disconnected();
        mqtt.accept_connections = false;
        assert!(mqtt.connect().is_err());
        assert!(!mqtt.is_connected());
    }

    #[test]
    fn mock_mqtt_message_queue_is_fifo() {
        let mut mqtt = MockMqtt::new();
        mqtt.queue_message("a", b"1".to_vec());
        mqtt.queue_message("b", b"2".to_vec());
        assert_eq!(mqtt.try_recv().unwrap().topic, "a");
        assert_eq!(mqtt.try_recv().unwrap().topic, "b");
        assert!(mqtt.try_recv().is_none());
    }

    #[test]
    fn mock_mqtt_operation_order() {
        let mut mqtt = MockMqtt::new();
        mqtt.subscribe("s").unwrap();
        mqtt.publish("p", b"", false).unwrap();
        assert_eq!(
            mqtt.operations,
            [MqttOp::Subscribe("s".into()), MqttOp::Publish("p".into())]
        );
    }

    // =========================================================================
    // Input Mocks
    // =========================================================================

    #[test]
    fn mock_button_edge() {
        let mut button = MockButton::new();
        assert!(!button.just_pressed());
        button.press();
        assert!(button.just_pressed());
        assert!(!button.just_pressed());
        button.release();
        assert!(!button.is_pressed());
    }

    #[test]
    fn mock_reset_detector_is_one_shot() {
        let mut reset = MockResetDetector::double_reset();
        assert!(reset.detected());
        assert!(!reset.detected());
    }

    #[test]
    fn mock_reset_detector_disarms_after_window() {
        let mut reset = MockResetDetector::new();
        reset.tick(9_999);
        assert!(reset.armed);
        reset.tick(10_000);
        assert!(!reset.armed);
    }

    #[test]
    fn mock_portal_prefill() {
        let mut portal = MockPortal::new();
        let settings = DeviceSettings::new("Kitchen", "10.0.0.2", "", "");
        portal.open(&settings).unwrap();
        assert!(portal.is_open());
        assert_eq!(portal.prefilled, Some(settings));
        portal.close();
        assert!(!portal.is_open());
    }

    #[test]
    fn mock_clock() {
        let mut clock = MockClock::new();
        assert_eq!(clock.now_ms(), 0);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 250);
    }
}
