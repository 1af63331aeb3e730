//! ESP32 smart blinds firmware.
//!
//! This is the main entry point for the physical device. It wires the
//! ESP32 collaborators into a [`BlindsController`] and polls it every
//! 10 ms:
//! - Serial console lines move the servo directly
//! - Broker commands on `blinds/<name>/move` move the servo
//! - The BOOT button or a double reset opens the setup portal
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=home WIFI_PASSWORD=secret \
//!     cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/xtensa-esp32-espidf/release/esp32_main
//! ```

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, IOPin};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use smart_blinds::hal::esp32::{
    pins, Esp32Button, Esp32Clock, Esp32Console, Esp32Mqtt, Esp32Platform, Esp32Portal,
    Esp32ResetDetector, Esp32Servo, Esp32Spiffs, Esp32Wifi, StationCredentials,
};
use smart_blinds::session::BrokerTarget;
use smart_blinds::traits::{Board, Clock, NetworkLink};
use smart_blinds::{BlindsController, Config, DeviceSettings, Mode};
use std::thread;
use std::time::Duration;

/// Main loop interval in milliseconds
const LOOP_INTERVAL_MS: u64 = 10;

fn main() -> anyhow::Result<()> {
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    log::info!("smart-blinds {} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::default();
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // =========================================================================
    // Actuator and local inputs
    // =========================================================================
    let servo = Esp32Servo::new(
        peripherals.pins.gpio13,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        &config.actuator,
    )?;
    log::info!("servo on GPIO{}", pins::SERVO);

    let button = Esp32Button::new(peripherals.pins.gpio0.downgrade())?;

    let uart = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio1,
        peripherals.pins.gpio3,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(pins::UART_BAUD.Hz()),
    )?;
    let console = Esp32Console::new(uart);

    let reset = Esp32ResetDetector::new(nvs.clone())?;

    // =========================================================================
    // Network
    // =========================================================================
    let wifi = Esp32Wifi::new(
        peripherals.modem,
        sysloop,
        Some(nvs),
        StationCredentials {
            ssid: option_env!("WIFI_SSID").unwrap_or(""),
            password: option_env!("WIFI_PASSWORD").unwrap_or(""),
        },
    )?;
    let network = wifi.link();
    let identity = network.identity().to_string();

    // Settings are not loaded yet; the client is replaced after start.
    let mqtt = Esp32Mqtt::new(BrokerTarget::new(
        &DeviceSettings::default(),
        &identity,
        &config.mqtt,
    ));
    let portal = Esp32Portal::new(wifi, config.portal.clone());

    // =========================================================================
    // Controller
    // =========================================================================
    let board = Board::<Esp32Platform> {
        servo,
        delay: FreeRtos,
        console,
        button,
        reset,
        network,
        mqtt,
        fs: Esp32Spiffs::new(),
        portal,
    };
    let clock = Esp32Clock::new();
    let mut controller = BlindsController::new(board, config)?;
    controller.start(clock.now_ms());

    let target = BrokerTarget::new(controller.settings(), &identity, &controller.config().mqtt);
    if controller.mqtt().target() != &target {
        controller.replace_mqtt(Esp32Mqtt::new(target));
    }

    if let Mode::Provisioning { trigger, .. } = controller.mode() {
        log::info!(
            "setup portal open ({:?}): join '{}' and browse to http://192.168.71.1/",
            trigger,
            controller.config().portal.ap_name
        );
    }

    // =========================================================================
    // Main Loop
    // =========================================================================
    loop {
        controller.poll(clock.now_ms());

        if controller.broker_changed() {
            let target =
                BrokerTarget::new(controller.settings(), &identity, &controller.config().mqtt);
            log::info!("broker changed, reconnecting to {}", target.url());
            controller.replace_mqtt(Esp32Mqtt::new(target));
        }

        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }
}
