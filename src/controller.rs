//! Main blinds controller that ties everything together.
//!
//! [`BlindsController`] owns every collaborator and is driven by calling
//! [`poll`](BlindsController::poll) from the main loop. Each poll services,
//! in order:
//!
//! 1. provisioning portal housekeeping (submission, timeout)
//! 2. the setup button
//! 3. one serial console line
//! 4. broker connectivity and incoming broker messages
//! 5. the double-reset detector
//!
//! Nothing here blocks except a servo move, which holds the loop for the
//! settle duration.
//!
//! # Example
//!
//! ```rust
//! use smart_blinds::{BlindsController, Config, Mode};
//! use smart_blinds::hal::{mock_board, MockPlatform};
//!
//! let mut board = mock_board();
//! board.fs.insert(
//!     "/config.json",
//!     br#"{"deviceName":"Kitchen","mqttServer":"10.0.0.2","mqttUsername":"","mqttPassword":""}"#,
//! );
//!
//! let mut controller = BlindsController::<MockPlatform>::new(board, Config::default()).unwrap();
//! controller.start(0);
//! assert_eq!(controller.mode(), Mode::Normal);
//!
//! controller.console_mut().queue_line("255");
//! controller.poll(10);
//! assert_eq!(controller.actuator().servo().angle, Some(160));
//! ```

extern crate alloc;
use alloc::format;
use alloc::string::ToString;

use log::{debug, error, info, warn};

use crate::actuator::ActuatorDriver;
use crate::commands::{CommandRouter, CommandSource, RouteOutcome};
use crate::config::Config;
use crate::discovery::{DiscoveryAnnouncer, PAYLOAD_OFF, PAYLOAD_ON};
use crate::error::Error;
use crate::mapping::RangeMap;
use crate::session::{Session, SessionAction};
use crate::settings::{DeviceSettings, ProvisioningParams, SettingsStore};
use crate::topics::TopicSet;
use crate::traits::{
    Board, ConfigButton, MqttClient, NetworkLink, Platform, Provisioner, ResetDetector,
    SerialConsole,
};
use crate::validation::OpennessCommand;

/// Why the provisioning portal was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisioningTrigger {
    /// No usable stored settings at boot.
    MissingSettings,
    /// Setup button pressed.
    ConfigButton,
    /// Two resets in quick succession.
    DoubleReset,
}

/// Operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Serving serial and broker commands.
    Normal,
    /// Portal open; broker traffic suspended.
    Provisioning {
        /// What opened the portal.
        trigger: ProvisioningTrigger,
        /// When the portal was opened.
        since_ms: u64,
    },
}

/// The blinds application context.
pub struct BlindsController<P: Platform> {
    config: Config,
    router: CommandRouter<P::Servo, P::Delay>,
    store: SettingsStore<P::Fs>,
    settings: DeviceSettings,
    provisioned: bool,
    announcer: DiscoveryAnnouncer,
    session: Session,
    mode: Mode,
    broker_changed: bool,
    console: P::Console,
    button: P::Button,
    reset: P::Reset,
    network: P::Network,
    mqtt: P::Mqtt,
    portal: P::Portal,
}

impl<P: Platform> BlindsController<P> {
    /// Build a controller from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] if the configured input scale or travel
    /// range is unusable.
    pub fn new(board: Board<P>, config: Config) -> Result<Self, Error> {
        let map = RangeMap::new(config.input, config.actuator.closed, config.actuator.open)?;
        let actuator = ActuatorDriver::new(board.servo, board.delay, config.actuator.settle_ms);

        Ok(Self {
            router: CommandRouter::new(actuator, map),
            store: SettingsStore::new(board.fs, config.storage.settings_path.as_str()),
            settings: DeviceSettings::default(),
            provisioned: false,
            announcer: DiscoveryAnnouncer::new(config.mqtt.clone()),
            session: Session::new(config.mqtt.retry_delay_ms),
            mode: Mode::Normal,
            broker_changed: false,
            console: board.console,
            button: board.button,
            reset: board.reset,
            network: board.network,
            mqtt: board.mqtt,
            portal: board.portal,
            config,
        })
    }

    /// Boot sequence: home the servo, load settings, pick the mode.
    ///
    /// Missing or unreadable settings, or a double reset, open the
    /// provisioning portal instead of starting normal operation.
    pub fn start(&mut self, now_ms: u64) {
        if let Err(e) = self.router.home() {
            error!("controller: homing failed: {:?}", e);
        }

        let double_reset = self.reset.detected();

        let mut trigger = match self.store.load() {
            Ok(settings) => {
                self.settings = settings;
                self.provisioned = true;
                None
            }
            Err(e) => {
                let e = Error::from(e);
                warn!("controller: using default settings ({}: {})", e.kind().as_str(), e);
                self.settings = DeviceSettings::default();
                self.provisioned = false;
                Some(ProvisioningTrigger::MissingSettings)
            }
        };
        if double_reset {
            trigger = Some(ProvisioningTrigger::DoubleReset);
        }

        match trigger {
            Some(trigger) => self.enter_provisioning(trigger, now_ms),
            None => self.mode = Mode::Normal,
        }

        self.console.write_line("Ready...");
    }

    /// One pass of the main loop.
    pub fn poll(&mut self, now_ms: u64) {
        self.service_portal(now_ms);

        if self.button.just_pressed() {
            info!("controller: setup button pressed");
            self.enter_provisioning(ProvisioningTrigger::ConfigButton, now_ms);
        }

        if let Some(line) = self.console.read_line() {
            self.handle_serial(&line);
        }

        if self.mode == Mode::Normal {
            self.service_broker(now_ms);
        } else {
            self.discard_messages();
        }

        self.reset.tick(now_ms);
        if self.reset.detected() {
            info!("controller: double reset detected");
            self.enter_provisioning(ProvisioningTrigger::DoubleReset, now_ms);
        }
    }

    // ========================================================================
    // Provisioning
    // ========================================================================

    fn enter_provisioning(&mut self, trigger: ProvisioningTrigger, now_ms: u64) {
        info!("controller: entering provisioning ({:?})", trigger);
        self.portal.close();
        if let Err(e) = self.portal.open(&self.settings) {
            error!("controller: portal failed to open: {:?}", e);
        }
        self.mode = Mode::Provisioning {
            trigger,
            since_ms: now_ms,
        };
    }

    fn service_portal(&mut self, now_ms: u64) {
        let Mode::Provisioning { trigger, since_ms } = self.mode else {
            return;
        };

        if let Some(params) = self.portal.poll() {
            self.complete_provisioning(&params);
            return;
        }

        let Some(timeout) = self.config.portal.timeout_ms() else {
            return;
        };
        if now_ms.saturating_sub(since_ms) < timeout {
            return;
        }

        if self.provisioned {
            warn!("controller: portal timed out, resuming with stored settings");
            self.leave_provisioning();
        } else {
            warn!("controller: portal timed out without settings, reopening");
            self.enter_provisioning(trigger, now_ms);
        }
    }

    fn complete_provisioning(&mut self, params: &ProvisioningParams) {
        let updated = self.store.apply_provisioning(params);
        let previous = core::mem::replace(&mut self.settings, updated);
        self.provisioned = true;

        let renamed = self.settings.device_name() != previous.device_name();
        if renamed {
            self.retract_discovery(&previous);
        }
        // The client id carries the device name, so a rename needs a new client too.
        if renamed || self.settings.broker_differs(&previous) {
            info!("controller: broker identity changed");
            self.broker_changed = true;
        }

        info!(
            "controller: provisioned as '{}'",
            self.settings.device_name()
        );
        self.leave_provisioning();
    }

    fn leave_provisioning(&mut self) {
        self.portal.close();
        self.discard_messages();
        self.mode = Mode::Normal;
        // Resubscribe and re-announce under the current name.
        self.session.reset();
    }

    // ========================================================================
    // Serial
    // ========================================================================

    fn handle_serial(&mut self, line: &str) {
        let topics = self.topics();
        match self
            .router
            .route(CommandSource::Serial, line, None, &topics)
        {
            RouteOutcome::Moved { command, position } => {
                self.console.write_line(&format!("Servo to {}", position));
                self.publish_state(command, &topics);
            }
            RouteOutcome::Invalid(reason) => {
                self.console
                    .write_line(&format!("Invalid input: {}", reason));
            }
            RouteOutcome::ActuatorFault { position } => {
                self.console
                    .write_line(&format!("Servo error moving to {}", position));
            }
            RouteOutcome::Ignored => {}
        }
    }

    // ========================================================================
    // Broker
    // ========================================================================

    fn service_broker(&mut self, now_ms: u64) {
        let action = self
            .session
            .poll(now_ms, self.network.is_up(), self.mqtt.is_connected());

        match action {
            Some(SessionAction::Connect) => {
                if let Err(e) = self.mqtt.connect() {
                    warn!("controller: broker connect failed: {:?}", e);
                    self.session.attempt_failed(now_ms);
                }
            }
            Some(SessionAction::Establish) => {
                if let Err(e) = self.establish() {
                    warn!("controller: session setup failed ({}): {}", e.kind().as_str(), e);
                    self.session.attempt_failed(now_ms);
                }
            }
            Some(SessionAction::Lost) | None => {}
        }

        if self.session.is_online() {
            self.dispatch_messages();
        }
    }

    /// Subscribe first, then announce; a failed subscribe announces nothing.
    fn establish(&mut self) -> Result<(), Error> {
        let topics = self.topics();
        self.mqtt
            .subscribe(&topics.move_topic)
            .map_err(Error::transport)?;
        info!("controller: subscribed to {}", topics.move_topic);

        self.announcer
            .announce(&self.settings, &mut self.mqtt)
            .map_err(Error::transport)
    }

    fn dispatch_messages(&mut self) {
        while let Some(msg) = self.mqtt.try_recv() {
            let topics = self.topics();
            let Some(payload) = msg.payload_str() else {
                debug!("controller: non-UTF-8 payload on {}", msg.topic);
                continue;
            };

            let outcome =
                self.router
                    .route(CommandSource::Broker, payload, Some(&msg.topic), &topics);
            if let RouteOutcome::Moved { command, .. } = outcome {
                self.publish_state(command, &topics);
            }
        }
    }

    /// Drop broker messages that arrived while broker traffic was suspended.
    fn discard_messages(&mut self) {
        let mut dropped = 0u32;
        while self.mqtt.try_recv().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("controller: dropped {} broker message(s) during provisioning", dropped);
        }
    }

    fn retract_discovery(&mut self, previous: &DeviceSettings) {
        if !self.session.is_online() {
            return;
        }
        if let Err(e) = self.announcer.retract(previous, &mut self.mqtt) {
            warn!("controller: discovery retract failed: {:?}", e);
        }
    }

    fn publish_state(&mut self, command: OpennessCommand, topics: &TopicSet) {
        if self.mode != Mode::Normal
            || !self.config.mqtt.publish_state
            || !self.session.is_online()
        {
            return;
        }
        if let Err(e) = self.try_publish_state(command, topics) {
            warn!("controller: state publish failed: {}", e);
        }
    }

    fn try_publish_state(
        &mut self,
        command: OpennessCommand,
        topics: &TopicSet,
    ) -> Result<(), Error> {
        let state = if command.is_open() {
            PAYLOAD_ON
        } else {
            PAYLOAD_OFF
        };
        let brightness = command.value().to_string();

        self.mqtt
            .publish(&topics.state, state.as_bytes(), true)
            .map_err(Error::transport)?;
        self.mqtt
            .publish(&topics.brightness, brightness.as_bytes(), true)
            .map_err(Error::transport)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// Whether the settings came from storage or the portal (not defaults).
    pub fn is_provisioned(&self) -> bool {
        self.provisioned
    }

    /// Topics for the current settings.
    pub fn topics(&self) -> TopicSet {
        self.announcer.topics(&self.settings)
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connection state machine.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Servo driver.
    pub fn actuator(&self) -> &ActuatorDriver<P::Servo, P::Delay> {
        self.router.actuator()
    }

    /// Settings store.
    pub fn store(&self) -> &SettingsStore<P::Fs> {
        &self.store
    }

    /// Whether provisioning changed the broker address, credentials or
    /// device name (which is part of the client id).
    ///
    /// The running client still points at the old broker; build a new one
    /// and hand it over with [`replace_mqtt`](Self::replace_mqtt).
    pub fn broker_changed(&self) -> bool {
        self.broker_changed
    }

    /// Swap in a new broker client and reconnect with it.
    pub fn replace_mqtt(&mut self, mqtt: P::Mqtt) {
        self.mqtt = mqtt;
        self.broker_changed = false;
        self.session.reset();
    }

    /// Broker client.
    pub fn mqtt(&self) -> &P::Mqtt {
        &self.mqtt
    }

    /// Broker client, mutably.
    pub fn mqtt_mut(&mut self) -> &mut P::Mqtt {
        &mut self.mqtt
    }

    /// Serial console.
    pub fn console(&self) -> &P::Console {
        &self.console
    }

    /// Serial console, mutably.
    pub fn console_mut(&mut self) -> &mut P::Console {
        &mut self.console
    }

    /// Setup button, mutably.
    pub fn button_mut(&mut self) -> &mut P::Button {
        &mut self.button
    }

    /// Reset detector, mutably.
    pub fn reset_mut(&mut self) -> &mut P::Reset {
        &mut self.reset
    }

    /// Network link, mutably.
    pub fn network_mut(&mut self) -> &mut P::Network {
        &mut self.network
    }

    /// Provisioning portal.
    pub fn portal(&self) -> &P::Portal {
        &self.portal
    }

    /// Provisioning portal, mutably.
    pub fn portal_mut(&mut self) -> &mut P::Portal {
        &mut self.portal
    }
}
