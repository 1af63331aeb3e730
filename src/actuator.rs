//! The only path to the blind servo.
//!
//! Every move is the same strictly ordered sequence:
//!
//! 1. attach the servo signal
//! 2. write the target angle
//! 3. block for the settle duration
//! 4. detach
//!
//! Detaching after every move leaves an idle blind silent and unpowered.
//! There is no position feedback; the settle duration must cover the
//! worst-case travel of the linkage.
//!
//! [`ActuatorDriver`] owns the servo handle outright and `move_to` takes
//! `&mut self`, so two moves can never overlap.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::mapping::ActuatorPosition;
use crate::traits::ServoActuator;

/// Drives a [`ServoActuator`] through the attach/write/settle/detach cycle.
///
/// # Example
///
/// ```rust
/// use smart_blinds::actuator::ActuatorDriver;
/// use smart_blinds::hal::{MockDelay, MockServo};
/// use smart_blinds::mapping::ActuatorPosition;
///
/// let mut driver = ActuatorDriver::new(MockServo::new(), MockDelay::new(), 700);
/// driver.home().unwrap();
/// driver.move_to(ActuatorPosition::MAX).unwrap();
///
/// assert_eq!(driver.last_position(), Some(ActuatorPosition::MAX));
/// assert_eq!(driver.delay().total_ms, 1400);
/// ```
pub struct ActuatorDriver<S, D> {
    servo: S,
    delay: D,
    settle_ms: u32,
    last_position: Option<ActuatorPosition>,
}

impl<S: ServoActuator, D: DelayNs> ActuatorDriver<S, D> {
    /// Take ownership of the servo and its settle delay.
    pub fn new(servo: S, delay: D, settle_ms: u32) -> Self {
        Self {
            servo,
            delay,
            settle_ms,
            last_position: None,
        }
    }

    /// Move to `position` and return once the settle time has elapsed.
    ///
    /// If the angle cannot be written the settle wait is skipped, but the
    /// servo is still detached before the error is returned.
    pub fn move_to(&mut self, position: ActuatorPosition) -> Result<(), S::Error> {
        debug!("actuator: moving to {}", position);

        self.servo.attach()?;

        let written = self.servo.write_angle(position.degrees());
        if written.is_ok() {
            self.delay.delay_ms(self.settle_ms);
        }

        let detached = self.servo.detach();
        if let Err(e) = &detached {
            warn!("actuator: detach failed: {:?}", e);
        }

        written?;
        detached?;

        self.last_position = Some(position);
        Ok(())
    }

    /// Drive to the closed reference position.
    ///
    /// Run once at startup, before any command is accepted, so the blind
    /// starts from a known place.
    pub fn home(&mut self) -> Result<(), S::Error> {
        self.move_to(ActuatorPosition::MIN)
    }

    /// Last position a move completed at, if any.
    pub fn last_position(&self) -> Option<ActuatorPosition> {
        self.last_position
    }

    /// Settle duration in milliseconds.
    pub fn settle_ms(&self) -> u32 {
        self.settle_ms
    }

    /// Borrow the servo (for inspection).
    pub fn servo(&self) -> &S {
        &self.servo
    }

    /// Borrow the delay (for inspection).
    pub fn delay(&self) -> &D {
        &self.delay
    }
}
