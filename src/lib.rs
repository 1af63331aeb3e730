//! # smart-blinds
//!
//! Firmware for a motorized window blind: a hobby servo turns the tilt rod,
//! and commands arrive from a serial console or an MQTT broker that also
//! hosts a home-automation hub.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the servo, console, setup button,
//!   storage and network, with mocks for desktop testing
//! - **Two command sources**: Serial console and MQTT, through one
//!   validation and mapping pipeline
//! - **Auto-discovery**: Announces itself to Home Assistant as a dimmable
//!   light after every broker (re)connect
//! - **Provisioning**: Device name and broker settings collected by a local
//!   portal and persisted as JSON
//! - **Non-blocking reconnects**: A timer-driven session state machine keeps
//!   serial control available through network outages
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, storage and network abstractions
//! - `mapping` / `validation` - Openness value to servo angle
//! - `actuator` - attach / write / settle / detach move cycle
//! - `commands` - Routes serial and broker payloads to the actuator
//! - `settings` - Persisted device and broker settings
//! - `provisioning` - Setup portal pages shared by desktop and ESP32
//! - `discovery` / `topics` - Topic naming and the discovery record
//! - `session` - Network and broker connection state machine
//! - `controller` - Main loop context that ties everything together
//! - `hal` - Concrete implementations (mock, desktop, esp32)
//!
//! ## Example
//!
//! ```rust
//! use smart_blinds::{BlindsController, Config, Mode, ProvisioningTrigger};
//! use smart_blinds::hal::{mock_board, MockPlatform};
//! use smart_blinds::settings::ProvisioningParams;
//!
//! // Fresh device: nothing stored, so the portal opens.
//! let mut controller = BlindsController::<MockPlatform>::new(mock_board(), Config::default()).unwrap();
//! controller.start(0);
//! assert!(matches!(
//!     controller.mode(),
//!     Mode::Provisioning { trigger: ProvisioningTrigger::MissingSettings, .. }
//! ));
//!
//! // The user fills in the form.
//! controller.portal_mut().submit(ProvisioningParams {
//!     device_name: "Kitchen".into(),
//!     broker_address: "10.0.0.2".into(),
//!     ..Default::default()
//! });
//! controller.poll(100);
//! assert_eq!(controller.mode(), Mode::Normal);
//!
//! // Next polls connect, subscribe and announce.
//! controller.poll(200);
//! controller.poll(300);
//! assert!(controller.mqtt().is_subscribed("blinds/Kitchen/move"));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Servo move cycle with settle delay.
pub mod actuator;
/// Command routing from serial and broker sources.
pub mod commands;
/// Main controller that coordinates commands, provisioning and the broker session.
pub mod controller;
/// Home Assistant discovery record and announcer.
pub mod discovery;
/// Crate-level error type.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Openness scale to servo angle mapping.
pub mod mapping;
/// Network and broker connection state machine.
pub mod session;
/// Provisioning portal pages and submission handling.
pub mod provisioning;
/// Persisted device settings.
pub mod settings;
/// MQTT topic naming.
pub mod topics;
/// Core traits for hardware, storage and network abstraction.
pub mod traits;
/// Command payload validation.
pub mod validation;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Desktop network services: MQTT client and provisioning portal (feature-gated).
#[cfg(any(feature = "mqtt", feature = "portal"))]
pub mod services;

// Re-exports for convenience
pub use actuator::ActuatorDriver;
pub use commands::{CommandRouter, CommandSource, RouteOutcome};
pub use controller::{BlindsController, Mode, ProvisioningTrigger};
pub use error::{Error, ErrorKind};
pub use mapping::{map_to_actuator, ActuatorPosition, InputScale, MappingError, RangeMap};
pub use session::{BrokerTarget, LinkState, Session, SessionAction};
pub use settings::{DeviceSettings, ProvisioningParams, SettingsError, SettingsStore};
pub use topics::TopicSet;
pub use traits::{
    // Platform
    Board,
    // Hardware
    Clock,
    ConfigButton,
    // Storage
    FileSystem,
    // Network
    MqttClient,
    MqttMessage,
    NetworkLink,
    Platform,
    Provisioner,
    ResetDetector,
    SerialConsole,
    ServoActuator,
};
pub use validation::{validate, InvalidInput, OpennessCommand};

// Config re-exports
pub use config::{ActuatorConfig, Config, MqttConfig, PortalConfig, StorageConfig};
