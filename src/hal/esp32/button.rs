//! Setup push button on a GPIO.

use crate::traits::ConfigButton;
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_hal::sys::EspError;

/// Active-low push button with internal pull-up.
///
/// Wire the button between the pin and ground. On most dev boards GPIO0
/// is the BOOT button, which works out of the box.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::IOPin;
/// use smart_blinds::hal::esp32::Esp32Button;
///
/// let button = Esp32Button::new(peripherals.pins.gpio0.downgrade())?;
/// ```
pub struct Esp32Button<'d> {
    pin: PinDriver<'d, AnyIOPin, Input>,
    was_pressed: bool,
}

impl<'d> Esp32Button<'d> {
    /// Configure `pin` as a pulled-up input.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO configuration fails.
    pub fn new(pin: AnyIOPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        let was_pressed = pin.is_low();
        Ok(Self { pin, was_pressed })
    }
}

impl ConfigButton for Esp32Button<'_> {
    fn is_pressed(&self) -> bool {
        self.pin.is_low()
    }

    fn just_pressed(&mut self) -> bool {
        let pressed = self.is_pressed();
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        edge
    }
}
