//! Command routing from the serial console and the broker to the servo.
//!
//! Both sources end in the same pipeline:
//!
//! ```text
//! payload -> (broker only: topic filter, ON/OFF aliases) -> validate -> map -> move
//! ```
//!
//! Routing is synchronous; [`CommandRouter::route`] returns only after the
//! servo has settled.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::actuator::ActuatorDriver;
use crate::discovery::{PAYLOAD_OFF, PAYLOAD_ON};
use crate::mapping::{ActuatorPosition, RangeMap};
use crate::topics::TopicSet;
use crate::traits::ServoActuator;
use crate::validation::{validate, InvalidInput, OpennessCommand};

/// Where a command came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandSource {
    /// Local serial console.
    Serial,
    /// MQTT broker.
    Broker,
}

impl CommandSource {
    /// Returns the source as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CommandSource::Serial => "serial",
            CommandSource::Broker => "broker",
        }
    }
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of routing one payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The servo moved.
    Moved {
        /// Validated command.
        command: OpennessCommand,
        /// Position the servo was driven to.
        position: ActuatorPosition,
    },
    /// Broker message for a topic other than ours. Not an error.
    Ignored,
    /// Payload rejected; nothing moved.
    Invalid(InvalidInput),
    /// Payload was valid but the servo reported an error.
    ActuatorFault {
        /// Position the servo was asked for.
        position: ActuatorPosition,
    },
}

impl RouteOutcome {
    /// Whether the servo reached a new position.
    pub fn moved(&self) -> bool {
        matches!(self, RouteOutcome::Moved { .. })
    }
}

/// Turns command payloads into servo moves.
///
/// Owns the [`ActuatorDriver`], so routing is the only way to move the blind
/// once the controller is running.
///
/// # Example
///
/// ```rust
/// use smart_blinds::commands::{CommandRouter, CommandSource, RouteOutcome};
/// use smart_blinds::actuator::ActuatorDriver;
/// use smart_blinds::config::MqttConfig;
/// use smart_blinds::hal::{MockDelay, MockServo};
/// use smart_blinds::mapping::{ActuatorPosition, InputScale, RangeMap};
/// use smart_blinds::settings::DeviceSettings;
/// use smart_blinds::topics::TopicSet;
///
/// let map = RangeMap::new(InputScale::BYTE, ActuatorPosition::MIN, ActuatorPosition::MAX).unwrap();
/// let driver = ActuatorDriver::new(MockServo::new(), MockDelay::new(), 700);
/// let mut router = CommandRouter::new(driver, map);
/// let topics = TopicSet::new(&MqttConfig::default(), &DeviceSettings::default());
///
/// let outcome = router.route(CommandSource::Broker, "ON", Some("blinds/SmartBlinds/move"), &topics);
/// assert!(outcome.moved());
/// assert_eq!(router.actuator().servo().angle, Some(160));
/// ```
pub struct CommandRouter<S, D> {
    actuator: ActuatorDriver<S, D>,
    map: RangeMap,
}

impl<S: ServoActuator, D: DelayNs> CommandRouter<S, D> {
    /// Router feeding `actuator` through `map`.
    pub fn new(actuator: ActuatorDriver<S, D>, map: RangeMap) -> Self {
        Self { actuator, map }
    }

    /// Route one payload.
    ///
    /// `topic` is the broker topic the payload arrived on; it is ignored for
    /// serial commands. Broker payloads `ON` and `OFF` (exact case) stand for
    /// the top of the input scale and 0.
    pub fn route(
        &mut self,
        source: CommandSource,
        payload: &str,
        topic: Option<&str>,
        topics: &TopicSet,
    ) -> RouteOutcome {
        let command = match source {
            CommandSource::Broker => {
                if topic != Some(topics.move_topic.as_str()) {
                    debug!("router: ignoring message on {:?}", topic);
                    return RouteOutcome::Ignored;
                }
                self.parse_broker(payload)
            }
            CommandSource::Serial => validate(payload, self.map.input()),
        };

        let command = match command {
            Ok(command) => command,
            Err(reason) => {
                warn!("router: invalid {} command {:?}: {}", source, payload, reason);
                return RouteOutcome::Invalid(reason);
            }
        };

        let position = self.map.map(command.value());
        info!(
            "router: {} command {} -> position {}",
            source,
            command.value(),
            position
        );

        match self.actuator.move_to(position) {
            Ok(()) => RouteOutcome::Moved { command, position },
            Err(e) => {
                warn!("router: actuator error: {:?}", e);
                RouteOutcome::ActuatorFault { position }
            }
        }
    }

    fn parse_broker(&self, payload: &str) -> Result<OpennessCommand, InvalidInput> {
        let scale = self.map.input();
        match payload {
            PAYLOAD_ON => Ok(OpennessCommand::new(scale.max())),
            PAYLOAD_OFF => Ok(OpennessCommand::new(0)),
            raw => validate(raw, scale),
        }
    }

    /// Home the servo (startup reference move).
    pub fn home(&mut self) -> Result<(), S::Error> {
        self.actuator.home()
    }

    /// The mapping in use.
    pub fn map(&self) -> &RangeMap {
        &self.map
    }

    /// Borrow the actuator driver.
    pub fn actuator(&self) -> &ActuatorDriver<S, D> {
        &self.actuator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MqttConfig;
    use crate::hal::{MockDelay, MockServo, ServoEvent};
    use crate::mapping::InputScale;
    use crate::settings::DeviceSettings;

    fn router(scale: InputScale) -> CommandRouter<MockServo, MockDelay> {
        let map = RangeMap::new(scale, ActuatorPosition::MIN, ActuatorPosition::MAX).unwrap();
        CommandRouter::new(ActuatorDriver::new(MockServo::new(), MockDelay::new(), 700), map)
    }

    fn topics() -> TopicSet {
        TopicSet::new(
            &MqttConfig::default(),
            &DeviceSettings::new("Kitchen", "10.0.0.2", "", ""),
        )
    }

    const MOVE: Option<&str> = Some("blinds/Kitchen/move");

    #[test]
    fn serial_command_moves() {
        let mut r = router(InputScale::BYTE);
        let outcome = r.route(CommandSource::Serial, "255", None, &topics());

        assert_eq!(
            outcome,
            RouteOutcome::Moved {
                command: OpennessCommand::new(255),
                position: ActuatorPosition::MAX,
            }
        );
        assert_eq!(r.actuator().servo().angle, Some(160));
    }

    #[test]
    fn zero_maps_to_closed() {
        let mut r = router(InputScale::BYTE);
        let outcome = r.route(CommandSource::Serial, "0", None, &topics());
        assert!(matches!(
            outcome,
            RouteOutcome::Moved { position, .. } if position == ActuatorPosition::MIN
        ));
    }

    #[test]
    fn serial_has_no_aliases() {
        let mut r = router(InputScale::BYTE);
        let outcome = r.route(CommandSource::Serial, "ON", None, &topics());
        assert!(matches!(outcome, RouteOutcome::Invalid(InvalidInput::NonDigit { .. })));
        assert!(r.actuator().servo().events.is_empty());
    }

    #[test]
    fn broker_on_off_aliases() {
        let mut r = router(InputScale::BYTE);

        let on = r.route(CommandSource::Broker, "ON", MOVE, &topics());
        assert!(matches!(on, RouteOutcome::Moved { command, .. } if command.value() == 255));

        let off = r.route(CommandSource::Broker, "OFF", MOVE, &topics());
        assert!(matches!(off, RouteOutcome::Moved { command, .. } if command.value() == 0));

        // Same result regardless of where the blind was.
        let off_again = r.route(CommandSource::Broker, "OFF", MOVE, &topics());
        assert_eq!(off, off_again);
    }

    #[test]
    fn on_alias_follows_scale() {
        let mut r = router(InputScale::PERCENT);
        let on = r.route(CommandSource::Broker, "ON", MOVE, &topics());
        assert!(matches!(
            on,
            RouteOutcome::Moved { command, position } if command.value() == 100 && position == ActuatorPosition::MAX
        ));
    }

    #[test]
    fn aliases_are_case_sensitive() {
        let mut r = router(InputScale::BYTE);
        for payload in ["on", "Off", "oN"] {
            let outcome = r.route(CommandSource::Broker, payload, MOVE, &topics());
            assert!(matches!(outcome, RouteOutcome::Invalid(_)), "{}", payload);
        }
        assert!(r.actuator().servo().events.is_empty());
    }

    #[test]
    fn broker_numeric_payload() {
        let mut r = router(InputScale::BYTE);
        let outcome = r.route(CommandSource::Broker, "128", MOVE, &topics());
        assert!(matches!(
            outcome,
            RouteOutcome::Moved { position, .. } if position.degrees() == 80
        ));
    }

    #[test]
    fn other_topics_are_ignored() {
        let mut r = router(InputScale::BYTE);
        let t = topics();

        for topic in [
            Some("blinds/Kitchen/state"),
            Some("blinds/Bedroom/move"),
            Some("blinds/Kitchen/move/extra"),
            None,
        ] {
            assert_eq!(
                r.route(CommandSource::Broker, "128", topic, &t),
                RouteOutcome::Ignored
            );
        }
        assert!(r.actuator().servo().events.is_empty());
    }

    #[test]
    fn ignored_even_when_payload_invalid() {
        let mut r = router(InputScale::BYTE);
        let outcome = r.route(
            CommandSource::Broker,
            "garbage",
            Some("blinds/Kitchen/brightness"),
            &topics(),
        );
        assert_eq!(outcome, RouteOutcome::Ignored);
    }

    #[test]
    fn invalid_payloads_do_not_move() {
        let mut r = router(InputScale::BYTE);
        for payload in ["", "abc", "12a", "-5", "256", "1.5"] {
            let outcome = r.route(CommandSource::Serial, payload, None, &topics());
            assert!(matches!(outcome, RouteOutcome::Invalid(_)), "{:?}", payload);
        }
        assert!(r.actuator().servo().events.is_empty());
    }

    #[test]
    fn actuator_failure_is_reported() {
        let map =
            RangeMap::new(InputScale::BYTE, ActuatorPosition::MIN, ActuatorPosition::MAX).unwrap();
        let mut servo = MockServo::new();
        servo.fail_writes = true;
        let mut r = CommandRouter::new(ActuatorDriver::new(servo, MockDelay::new(), 700), map);

        let outcome = r.route(CommandSource::Serial, "255", None, &topics());
        assert_eq!(
            outcome,
            RouteOutcome::ActuatorFault {
                position: ActuatorPosition::MAX
            }
        );
        assert_eq!(
            r.actuator().servo().events,
            [ServoEvent::Attach, ServoEvent::Detach]
        );
    }

    #[test]
    fn source_display() {
        assert_eq!(CommandSource::Serial.to_string(), "serial");
        assert_eq!(CommandSource::Broker.to_string(), "broker");
    }
}
