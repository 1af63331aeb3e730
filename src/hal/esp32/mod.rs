//! ESP32 hardware abstraction layer for a window-blind servo.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32 dev board (4MB flash, SPIFFS partition for settings)
//! - **Actuator**: hobby servo on an LEDC PWM channel
//! - **Setup button**: BOOT button (GPIO0, active low)
//! - **Console**: UART0 at 115200 baud (the USB serial port)
//!
//! # Pin Assignments
//!
//! See the [`pins`] module.

mod button;
mod clock;
mod console;
mod mqtt;
mod portal;
mod reset;
mod servo;
mod storage;
mod wifi;

pub use button::Esp32Button;
pub use clock::Esp32Clock;
pub use console::Esp32Console;
pub use mqtt::{Esp32Mqtt, Esp32MqttError};
pub use portal::Esp32Portal;
pub use reset::{Esp32ResetDetector, DOUBLE_RESET_WINDOW_MS};
pub use servo::Esp32Servo;
pub use storage::Esp32Spiffs;
pub use wifi::{Esp32Network, Esp32Wifi, StationCredentials};

use crate::traits::Platform;

/// Pin assignments.
pub mod pins {
    // =========================================================================
    // Actuator
    // =========================================================================

    /// Servo signal (LEDC channel 0)
    pub const SERVO: i32 = 13;

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Setup button (BOOT on most dev boards, active low)
    pub const CONFIG_BUTTON: i32 = 0;

    // =========================================================================
    // Console (UART0)
    // =========================================================================

    /// UART0 TX
    pub const UART_TX: i32 = 1;

    /// UART0 RX
    pub const UART_RX: i32 = 3;

    /// Console baud rate
    pub const UART_BAUD: u32 = 115_200;
}

/// The ESP32 collaborator set.
pub struct Esp32Platform;

impl Platform for Esp32Platform {
    type Servo = Esp32Servo<'static>;
    type Delay = esp_idf_hal::delay::FreeRtos;
    type Console = Esp32Console<'static>;
    type Button = Esp32Button<'static>;
    type Reset = Esp32ResetDetector;
    type Network = Esp32Network;
    type Mqtt = Esp32Mqtt;
    type Fs = Esp32Spiffs;
    type Portal = Esp32Portal;
}
