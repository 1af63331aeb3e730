//! Platform bundle tying the collaborator traits together.

use embedded_hal::delay::DelayNs;

use super::{
    ConfigButton, FileSystem, MqttClient, NetworkLink, Provisioner, ResetDetector, SerialConsole,
    ServoActuator,
};

/// A concrete set of collaborators the controller runs on.
///
/// Implemented by zero-sized marker types (`MockPlatform`, `Esp32Platform`,
/// the desktop demo's platform) so [`crate::BlindsController`] needs a
/// single type parameter.
pub trait Platform {
    /// Blind servo.
    type Servo: ServoActuator;
    /// Blocking delay used for the settle wait.
    type Delay: DelayNs;
    /// Serial command console.
    type Console: SerialConsole;
    /// Setup button.
    type Button: ConfigButton;
    /// Double-reset detector.
    type Reset: ResetDetector;
    /// Network status.
    type Network: NetworkLink;
    /// Broker client.
    type Mqtt: MqttClient;
    /// Settings filesystem.
    type Fs: FileSystem;
    /// Setup portal.
    type Portal: Provisioner;
}

/// Owned collaborators handed to the controller at construction.
pub struct Board<P: Platform> {
    /// Blind servo.
    pub servo: P::Servo,
    /// Settle delay.
    pub delay: P::Delay,
    /// Serial console.
    pub console: P::Console,
    /// Setup button.
    pub button: P::Button,
    /// Double-reset detector.
    pub reset: P::Reset,
    /// Network status.
    pub network: P::Network,
    /// Broker client.
    pub mqtt: P::Mqtt,
    /// Settings filesystem.
    pub fs: P::Fs,
    /// Setup portal.
    pub portal: P::Portal,
}
