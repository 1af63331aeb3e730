//! Desktop run of the blinds controller against a real broker.
//!
//! The servo is simulated, commands are typed on stdin, settings live in a
//! local directory and the setup portal is served on port 8080. Point an
//! automation hub at the same broker to see the discovery record and drive
//! the simulated blind.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=info cargo run --example desktop_blinds --features mqtt,portal
//! ```
//!
//! With no stored settings the portal opens at http://localhost:8080/.
//! Settings are kept in `./blinds-data` unless `SMART_BLINDS_DIR` says
//! otherwise.

use std::thread;
use std::time::Duration;

use smart_blinds::hal::{
    DesktopClock, DirFileSystem, HostNetwork, MockButton, MockResetDetector, SimulatedServo,
    StdDelay, StdinConsole,
};
use smart_blinds::services::{RumqttClient, WebPortal};
use smart_blinds::session::BrokerTarget;
use smart_blinds::traits::{Board, Clock, NetworkLink, Platform};
use smart_blinds::{BlindsController, Config, DeviceSettings, Mode, PortalConfig};
use tracing_subscriber::EnvFilter;

/// Main loop interval in milliseconds
const LOOP_INTERVAL_MS: u64 = 10;

struct DesktopPlatform;

impl Platform for DesktopPlatform {
    type Servo = SimulatedServo;
    type Delay = StdDelay;
    type Console = StdinConsole;
    type Button = MockButton;
    type Reset = MockResetDetector;
    type Network = HostNetwork;
    type Mqtt = RumqttClient;
    type Fs = DirFileSystem;
    type Portal = WebPortal;
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::default().with_portal(PortalConfig::default().with_port(8080));
    let data_dir = std::env::var("SMART_BLINDS_DIR").unwrap_or_else(|_| "blinds-data".into());

    let network = HostNetwork::new();
    let identity = network.identity().to_string();

    let board = Board::<DesktopPlatform> {
        servo: SimulatedServo::new(),
        delay: StdDelay,
        console: StdinConsole::spawn(),
        button: MockButton::default(),
        reset: MockResetDetector::new(),
        network,
        mqtt: RumqttClient::new(BrokerTarget::new(
            &DeviceSettings::default(),
            &identity,
            &config.mqtt,
        )),
        fs: DirFileSystem::new(&data_dir),
        portal: WebPortal::new(config.portal.clone()),
    };

    let clock = DesktopClock::new();
    let mut controller = BlindsController::new(board, config)?;
    controller.start(clock.now_ms());

    let target = BrokerTarget::new(controller.settings(), &identity, &controller.config().mqtt);
    if controller.mqtt().target() != &target {
        controller.replace_mqtt(RumqttClient::new(target));
    }

    match controller.mode() {
        Mode::Normal => println!(
            "Type an openness value (0-255); commands arrive on {}",
            controller.topics().move_topic
        ),
        Mode::Provisioning { .. } => println!(
            "Setup portal at http://localhost:{}/",
            controller.config().portal.port
        ),
    }

    loop {
        controller.poll(clock.now_ms());

        if controller.broker_changed() {
            let target =
                BrokerTarget::new(controller.settings(), &identity, &controller.config().mqtt);
            log::info!("broker changed, reconnecting to {}", target.url());
            controller.replace_mqtt(RumqttClient::new(target));
        }

        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
