//! Hobby servo driven by the ESP32 LEDC peripheral.
//!
//! A standard servo expects a 50 Hz frame with a 0.5 ms to 2.5 ms pulse
//! mapping linearly to 0..=180 degrees. Detaching sets the duty to zero,
//! which stops the pulse train so the servo stops holding and jittering.

use crate::config::ActuatorConfig;
use crate::traits::ServoActuator;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

/// Servo on one LEDC channel.
///
/// # Hardware Setup
///
/// - GPIO13 → servo signal (orange/yellow wire)
/// - Servo power from a separate 5 V supply, grounds tied together
///
/// # Example
///
/// ```ignore
/// use smart_blinds::hal::esp32::Esp32Servo;
/// use smart_blinds::config::ActuatorConfig;
///
/// let peripherals = Peripherals::take()?;
/// let servo = Esp32Servo::new(
///     peripherals.pins.gpio13,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
///     &ActuatorConfig::default(),
/// )?;
/// ```
pub struct Esp32Servo<'d> {
    channel: LedcDriver<'d>,
    min_pulse_us: u32,
    max_pulse_us: u32,
    attached: bool,
    last_degrees: u8,
}

impl<'d> Esp32Servo<'d> {
    /// Servo frame rate in Hz (20 ms period)
    const FREQ_HZ: u32 = 50;

    /// Frame period in microseconds
    const PERIOD_US: u32 = 1_000_000 / Self::FREQ_HZ;

    /// 14-bit resolution gives ~1.2 us per step at 50 Hz
    const RESOLUTION: Resolution = Resolution::Bits14;

    /// Creates a detached servo driver.
    ///
    /// # Errors
    ///
    /// Returns an error if LEDC initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(
        pin: P,
        timer: T,
        channel: C,
        config: &ActuatorConfig,
    ) -> Result<Self, EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::FREQ_HZ.Hz())
            .resolution(Self::RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let mut channel = LedcDriver::new(channel, &timer_driver, pin)?;

        // No pulses until the first attach
        channel.set_duty(0)?;

        Ok(Self {
            channel,
            min_pulse_us: config.min_pulse_us,
            max_pulse_us: config.max_pulse_us,
            attached: false,
            last_degrees: 0,
        })
    }

    /// Duty value for a pulse of `degrees`.
    fn duty_for(&self, degrees: u8) -> u32 {
        let degrees = degrees.min(180) as u32;
        let pulse_us =
            self.min_pulse_us + (self.max_pulse_us - self.min_pulse_us) * degrees / 180;
        let max_duty = self.channel.get_max_duty();
        (pulse_us as u64 * max_duty as u64 / Self::PERIOD_US as u64) as u32
    }

    /// Whether the pulse train is running.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl ServoActuator for Esp32Servo<'_> {
    type Error = EspError;

    fn attach(&mut self) -> Result<(), EspError> {
        self.attached = true;
        let duty = self.duty_for(self.last_degrees);
        self.channel.set_duty(duty)
    }

    fn write_angle(&mut self, degrees: u8) -> Result<(), EspError> {
        self.last_degrees = degrees;
        if self.attached {
            let duty = self.duty_for(degrees);
            self.channel.set_duty(duty)?;
        }
        Ok(())
    }

    fn detach(&mut self) -> Result<(), EspError> {
        self.attached = false;
        self.channel.set_duty(0)
    }
}
