//! Host implementations for running the controller on a desktop.
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SimulatedServo`] | [`ServoActuator`] |
//! | [`StdDelay`] | [`DelayNs`] |
//! | [`DesktopClock`] | [`Clock`] |
//! | [`StdinConsole`] | [`SerialConsole`] |
//! | [`HostNetwork`] | [`NetworkLink`] |

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::traits::{Clock, NetworkLink, SerialConsole, ServoActuator};

/// Servo stand-in that logs its position.
#[derive(Debug, Default)]
pub struct SimulatedServo {
    angle: Option<u8>,
    attached: bool,
}

impl SimulatedServo {
    /// Creates a detached servo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last angle written.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }
}

impl ServoActuator for SimulatedServo {
    type Error = core::convert::Infallible;

    fn attach(&mut self) -> Result<(), Self::Error> {
        self.attached = true;
        log::debug!("servo: attached");
        Ok(())
    }

    fn write_angle(&mut self, degrees: u8) -> Result<(), Self::Error> {
        self.angle = Some(degrees);
        log::info!("servo: -> {} deg", degrees);
        Ok(())
    }

    fn detach(&mut self) -> Result<(), Self::Error> {
        self.attached = false;
        log::debug!("servo: detached");
        Ok(())
    }
}

/// Blocking delay backed by `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Monotonic clock starting at zero when created.
#[derive(Debug, Clone, Copy)]
pub struct DesktopClock {
    start: Instant,
}

impl DesktopClock {
    /// Clock starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for DesktopClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for DesktopClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Console reading lines from stdin on a background thread.
///
/// Output goes to stdout, one line per call.
pub struct StdinConsole {
    lines: Receiver<String>,
}

impl StdinConsole {
    /// Spawn the stdin reader.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }
}

impl SerialConsole for StdinConsole {
    fn read_line(&mut self) -> Option<String> {
        match self.lines.try_recv() {
            Ok(line) => Some(line.trim_end_matches('\r').to_string()),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn write_line(&mut self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

/// Host network: always up, identified by the host name.
#[derive(Debug, Clone)]
pub struct HostNetwork {
    identity: String,
}

impl HostNetwork {
    /// Identity from `HOSTNAME`, or `desktop`.
    pub fn new() -> Self {
        let identity = std::env::var("HOSTNAME").unwrap_or_else(|_| "desktop".to_string());
        Self { identity }
    }

    /// Network with an explicit identity.
    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

impl Default for HostNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkLink for HostNetwork {
    fn is_up(&self) -> bool {
        true
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_servo_tracks_angle() {
        let mut servo = SimulatedServo::new();
        servo.attach().unwrap();
        servo.write_angle(80).unwrap();
        servo.detach().unwrap();
        assert_eq!(servo.angle(), Some(80));
    }

    #[test]
    fn desktop_clock_is_monotonic() {
        let clock = DesktopClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn host_network_identity() {
        let net = HostNetwork::with_identity("bench");
        assert!(net.is_up());
        assert_eq!(net.identity(), "bench");
    }
}
