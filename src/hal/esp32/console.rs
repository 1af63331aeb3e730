//! Serial command console on a UART.

use crate::hal::line::{LineBuffer, LineEvent};
use crate::traits::SerialConsole;
use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::uart::UartDriver;

/// Longest accepted line; longer lines are rejected whole.
const MAX_LINE: usize = 64;

/// Line-buffered console over a [`UartDriver`].
///
/// Bytes are collected without blocking until `\n`; `\r` is dropped so
/// both `\n` and `\r\n` terminals work.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::uart::{config::Config, UartDriver};
/// use smart_blinds::hal::esp32::Esp32Console;
///
/// let uart = UartDriver::new(
///     peripherals.uart0,
///     peripherals.pins.gpio1,
///     peripherals.pins.gpio3,
///     Option::<AnyIOPin>::None,
///     Option::<AnyIOPin>::None,
///     &Config::default().baudrate(115_200.Hz()),
/// )?;
/// let console = Esp32Console::new(uart);
/// ```
pub struct Esp32Console<'d> {
    uart: UartDriver<'d>,
    buffer: LineBuffer<MAX_LINE>,
}

impl<'d> Esp32Console<'d> {
    /// Console over `uart`.
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self {
            uart,
            buffer: LineBuffer::new(),
        }
    }
}

impl SerialConsole for Esp32Console<'_> {
    fn read_line(&mut self) -> Option<String> {
        let mut byte = [0u8; 1];
        while let Ok(1) = self.uart.read(&mut byte, NON_BLOCK) {
            match self.buffer.push(byte[0]) {
                Some(LineEvent::Line(line)) => return Some(line),
                Some(LineEvent::TooLong) => {
                    log::warn!("console: dropped line longer than {} characters", MAX_LINE);
                    self.write_line(&format!(
                        "Invalid input: longer than {} characters",
                        MAX_LINE
                    ));
                }
                None => {}
            }
        }
        None
    }

    fn write_line(&mut self, line: &str) {
        let _ = self.uart.write(line.as_bytes());
        let _ = self.uart.write(b"\r\n");
    }
}
