//! Hardware abstraction traits for the servo, console and physical inputs.
//!
//! This module defines the hardware interfaces that allow smart-blinds to
//! run on an ESP32 or on a desktop with mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ServoActuator`] | Pulse-width position servo |
//! | [`SerialConsole`] | Line-oriented command console |
//! | [`ConfigButton`] | "Enter setup" push button |
//! | [`ResetDetector`] | Double-reset detection |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! The settle wait after each move uses [`embedded_hal::delay::DelayNs`]
//! directly, so any HAL delay works unchanged.
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use smart_blinds::traits::ServoActuator;
//! use smart_blinds::hal::MockServo;
//!
//! let mut servo = MockServo::new();
//! servo.attach().unwrap();
//! servo.write_angle(90).unwrap();
//! servo.detach().unwrap();
//!
//! assert_eq!(servo.angle, Some(90));
//! assert!(!servo.attached);
//! ```

extern crate alloc;
use alloc::string::String;

/// Position servo driven by pulse width.
///
/// Mirrors the attach/write/detach life cycle of hobby servo drivers: while
/// attached the servo actively holds its position, once detached the
/// signal stops and the horn can idle without jitter or holding current.
///
/// # Implementation Notes
///
/// - `write_angle` takes degrees in `0..=180`; callers stay within the
///   blind's travel range.
/// - `detach` must be safe to call when not attached.
pub trait ServoActuator {
    /// Error type for servo operations.
    type Error: core::fmt::Debug;

    /// Start driving the servo signal.
    fn attach(&mut self) -> Result<(), Self::Error>;

    /// Command the servo to `degrees`.
    fn write_angle(&mut self, degrees: u8) -> Result<(), Self::Error>;

    /// Stop driving the servo signal.
    fn detach(&mut self) -> Result<(), Self::Error>;
}

/// Line-oriented serial console.
///
/// `read_line` must never block: it returns a completed line if one is
/// buffered and `None` otherwise. Line terminators (`\n` or `\r\n`) are
/// stripped by the implementation.
pub trait SerialConsole {
    /// Take the next complete line, if any.
    fn read_line(&mut self) -> Option<String>;

    /// Write one line of human-readable output.
    fn write_line(&mut self, line: &str);
}

/// The setup push button.
pub trait ConfigButton {
    /// Returns true while the button is held.
    fn is_pressed(&self) -> bool;

    /// Returns true once per press (edge detection).
    ///
    /// Default implementation just returns `is_pressed()`.
    /// Override for proper edge detection.
    fn just_pressed(&mut self) -> bool {
        self.is_pressed()
    }
}

/// Detects two resets within a short window.
///
/// Implementations arm a persistent flag at boot and clear it once the
/// detection window has passed; finding the flag still armed at the next
/// boot means the user reset twice in quick succession.
pub trait ResetDetector {
    /// Returns true once if a double reset was detected at boot.
    fn detected(&mut self) -> bool;

    /// Housekeeping; clears the armed flag once the window has elapsed.
    fn tick(&mut self, now_ms: u64);
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for retry and portal timers.
/// On desktop, this can wrap `std::time::Instant`. On embedded,
/// use a hardware timer.
///
/// # Example
///
/// ```rust
/// use smart_blinds::traits::Clock;
/// use smart_blinds::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
