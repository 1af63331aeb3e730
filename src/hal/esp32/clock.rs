//! Milliseconds since boot from the ESP-IDF high-resolution timer.

use crate::traits::Clock;

/// [`Clock`] reading `esp_timer_get_time()`.
///
/// Drives the controller's retry, portal-timeout and double-reset timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates the clock.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Safe: plain read of the boot timer.
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
